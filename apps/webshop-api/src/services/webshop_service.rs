//! Webshop endpoints.
//!
//! | Method | Path                | Action                         |
//! |--------|---------------------|--------------------------------|
//! | GET    | `/api/webshop`      | list, `?active=` filter        |
//! | POST   | `/api/webshop`      | create                         |
//! | GET    | `/api/webshop/{id}` | detail with product and category counts |
//! | DELETE | `/api/webshop/{id}` | soft delete                    |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use webshop_core::validation::validate_name;
use webshop_core::Webshop;
use webshop_db::NewWebshop;

use crate::error::{ApiError, ApiResult};
use crate::services::ApiJson;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WebshopQuery {
    pub active: Option<bool>,
}

/// Webshop with its catalog counts.
#[derive(Debug, Serialize)]
pub struct WebshopDetail {
    pub id: i64,
    pub active: bool,
    pub name: String,
    pub num_products: i64,
    pub num_categories: i64,
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WebshopQuery>,
) -> ApiResult<Json<Vec<Webshop>>> {
    let webshops = state.db.webshops().list(query.active).await?;
    Ok(Json(webshops))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewWebshop>,
) -> ApiResult<(StatusCode, Json<Webshop>)> {
    validate_name("name", &new.name)?;

    let webshop = state.db.webshops().insert(&new).await?;
    info!(id = webshop.id, name = %webshop.name, "Webshop created");
    Ok((StatusCode::CREATED, Json(webshop)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WebshopDetail>> {
    let repo = state.db.webshops();
    let webshop = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Webshop", id))?;

    Ok(Json(WebshopDetail {
        id: webshop.id,
        active: webshop.active,
        name: webshop.name,
        num_products: repo.num_products(id).await?,
        num_categories: repo.num_categories(id).await?,
        added_at: webshop.added_at,
        modified_at: webshop.modified_at,
    }))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.webshops().soft_delete(id).await?;
    info!(id, "Webshop deleted");
    Ok(StatusCode::NO_CONTENT)
}
