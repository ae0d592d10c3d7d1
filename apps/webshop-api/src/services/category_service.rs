//! Category endpoints.
//!
//! | Method | Path                 | Action                                   |
//! |--------|----------------------|------------------------------------------|
//! | GET    | `/api/category`      | light list, `?webshop=&parent=&active=`  |
//! | POST   | `/api/category`      | create                                   |
//! | GET    | `/api/category/{id}` | detail with children and products        |
//! | DELETE | `/api/category/{id}` | soft delete                              |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use webshop_core::validation::validate_name;
use webshop_core::Category;
use webshop_db::{CategoryFilter, NewCategory};

use crate::error::{ApiError, ApiResult};
use crate::services::product_service::{summarize, ProductSummary};
use crate::services::ApiJson;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub webshop: Option<i64>,
    pub parent: Option<i64>,
    pub active: Option<bool>,
}

/// Category as shown in listings and as a nested reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        CategorySummary {
            id: category.id,
            name: category.name.clone(),
            parent_id: category.parent_id,
        }
    }
}

/// Category with its active sub-categories and products.
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    pub id: i64,
    pub webshop_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub children: Vec<CategorySummary>,
    pub products: Vec<ProductSummary>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<CategorySummary>>> {
    let filter = CategoryFilter {
        webshop: query.webshop,
        parent: query.parent,
        active: query.active,
    };
    let categories = state.db.categories().list(&filter).await?;
    Ok(Json(categories.iter().map(CategorySummary::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate_name("name", &new.name)?;

    let category = state.db.categories().insert(&new).await?;
    info!(id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CategoryDetail>> {
    let repo = state.db.categories();
    let category = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    let children = repo.children(id).await?;
    let products = repo.products(&category).await?;

    Ok(Json(CategoryDetail {
        products: summarize(&state.db, products).await?,
        children: children.iter().map(CategorySummary::from).collect(),
        id: category.id,
        webshop_id: category.webshop_id,
        parent_id: category.parent_id,
        name: category.name,
        description: category.description,
        active: category.active,
    }))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.categories().soft_delete(id).await?;
    info!(id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
