//! Product endpoints.
//!
//! | Method    | Path                  | Action                                  |
//! |-----------|-----------------------|-----------------------------------------|
//! | GET       | `/api/product`        | paginated list with filters             |
//! | POST      | `/api/product`        | validate, then save                     |
//! | GET       | `/api/product/{id}`   | detail with resolved attributes         |
//! | PUT/PATCH | `/api/product/{id}`   | merge, validate, save                   |
//! | DELETE    | `/api/product/{id}`   | soft delete, demotes a childless parent |
//! | GET       | `/api/idonly/product` | ids matching the list filters           |
//!
//! ## Write Path
//! ```text
//! payload ──merge──► Product ──validate_product(parent)──► save_product
//!                                     │                        │
//!                              400 on a broken rule    derive prices, write,
//!                                                      propagate name
//! ```
//! Structure rules are checked here only. Storage never re-validates.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use webshop_core::pricing::can_be_parent;
use webshop_core::validation::{validate_price, validate_product};
use webshop_core::{
    BarcodeType, Lineage, Money, Product, ProductStructure, ValidationError, VatRate,
};
use webshop_db::{Database, Page, ProductFilter};

use crate::error::{ApiError, ApiResult};
use crate::services::category_service::CategorySummary;
use crate::services::{explicit_null, ApiJson, Paginated};
use crate::AppState;

// =============================================================================
// Query
// =============================================================================

/// Listing query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub active: Option<bool>,
    pub parent: Option<i64>,
    pub webshop: Option<i64>,
    pub structure: Option<String>,
    pub category: Option<i64>,
    pub featured: Option<bool>,
    /// Only stand-alone and parent products.
    pub default: Option<bool>,
}

impl ProductQuery {
    fn filter(&self) -> ApiResult<ProductFilter> {
        let structure = match self.structure.as_deref() {
            Some(name) => Some(ProductStructure::from_name(name).ok_or_else(|| {
                ApiError::from(ValidationError::NotAllowed {
                    field: "structure".to_string(),
                    allowed: vec![
                        "standalone".to_string(),
                        "parent".to_string(),
                        "child".to_string(),
                    ],
                })
            })?),
            None => None,
        };

        Ok(ProductFilter {
            active: self.active,
            parent: self.parent,
            webshop: self.webshop,
            structure,
            category: self.category,
            featured: self.featured,
            default_only: self.default.unwrap_or(false),
        })
    }

    /// Requested page, with the size clamped to `1..=max_page_size`.
    fn page(&self, default_size: u32, max_size: u32) -> Page {
        let size = self.page_size.unwrap_or(default_size).clamp(1, max_size);
        Page::new(self.page.unwrap_or(1), size)
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Product as shown in listings. Values are the effective ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub webshop_id: i64,
    pub structure: ProductStructure,
    pub parent_id: Option<i64>,
    pub title: String,
    pub category_id: Option<i64>,
    pub price: Option<Money>,
    pub active: bool,
    pub featured: bool,
}

impl ProductSummary {
    fn new(lineage: Lineage<'_>) -> Option<Self> {
        let product = lineage.product();
        Some(ProductSummary {
            id: product.id?,
            webshop_id: product.webshop_id,
            structure: product.structure,
            parent_id: product.parent_id,
            title: lineage.title().to_string(),
            category_id: lineage.category_id(),
            price: lineage.price(),
            active: product.active,
            featured: product.featured,
        })
    }
}

/// Full product view: own fields plus every resolved attribute.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub webshop_id: i64,
    pub structure: ProductStructure,
    pub parent_id: Option<i64>,
    pub name: String,
    pub title: String,
    pub description: String,
    pub active: bool,
    pub featured: bool,
    pub category: Option<CategorySummary>,
    pub barcode: String,
    pub barcode_type: BarcodeType,
    pub pcs_in_stock: Option<u32>,
    pub available_qty_in_stock: Option<u32>,
    pub price: Option<Money>,
    /// Own stored value, not resolved.
    pub price_excl_vat: Option<Money>,
    pub price_without_vat: Option<Money>,
    pub vat: VatRate,
    pub vat_amount: Option<Money>,
    pub is_discountable: bool,
    pub has_children: bool,
    pub children_min_price: Option<Money>,
    pub added_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Resolves listing rows, loading each distinct parent once.
pub(crate) async fn summarize(
    db: &Database,
    products: Vec<Product>,
) -> ApiResult<Vec<ProductSummary>> {
    let repo = db.products();
    let mut parents: HashMap<i64, Option<Product>> = HashMap::new();
    for product in products.iter().filter(|p| p.is_child()) {
        if let Some(parent_id) = product.parent_id {
            if !parents.contains_key(&parent_id) {
                parents.insert(parent_id, repo.get_by_id(parent_id).await?);
            }
        }
    }

    Ok(products
        .iter()
        .filter_map(|product| {
            let parent = product
                .parent_id
                .and_then(|id| parents.get(&id))
                .and_then(Option::as_ref);
            ProductSummary::new(Lineage::new(product, parent))
        })
        .collect())
}

async fn load_detail(db: &Database, id: i64) -> ApiResult<ProductDetail> {
    let repo = db.products();
    let (product, parent) = repo
        .get_with_parent(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    let lineage = Lineage::new(&product, parent.as_ref());

    let category = match lineage.category_id() {
        Some(category_id) => db
            .categories()
            .get_by_id(category_id)
            .await?
            .as_ref()
            .map(CategorySummary::from),
        None => None,
    };

    let children_min_price = if product.is_parent() {
        repo.children_min_price(&product).await?
    } else {
        None
    };

    Ok(ProductDetail {
        id,
        webshop_id: product.webshop_id,
        structure: product.structure,
        parent_id: product.parent_id,
        name: product.name.clone(),
        title: lineage.title().to_string(),
        description: product.description.clone(),
        active: product.active,
        featured: product.featured,
        category,
        barcode: lineage.barcode().to_string(),
        barcode_type: lineage.barcode_type(),
        pcs_in_stock: product.pcs_in_stock,
        available_qty_in_stock: lineage.available_qty_in_stock(),
        price: lineage.price(),
        price_excl_vat: product.price_excl_vat,
        price_without_vat: lineage.price_without_vat(),
        vat: lineage.vat(),
        vat_amount: lineage.vat_amount(),
        is_discountable: lineage.is_discountable(),
        has_children: repo.has_children(id).await?,
        children_min_price,
        added_at: product.added_at,
        modified_at: product.modified_at,
    })
}

// =============================================================================
// Payload
// =============================================================================

/// Create or update body. Absent fields keep their current value.
///
/// Nullable fields distinguish `null` (clear) from absent (keep).
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    pub webshop_id: Option<i64>,
    pub structure: Option<ProductStructure>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub parent_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub category_id: Option<Option<i64>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
    pub barcode_type: Option<BarcodeType>,
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub pcs_in_stock: Option<Option<u32>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub price: Option<Option<Money>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub price_excl_vat: Option<Option<Money>>,
    pub vat: Option<VatRate>,
    pub is_discountable: Option<bool>,
}

impl ProductPayload {
    /// Merges the payload into `product`.
    ///
    /// A payload setting `price` without `price_excl_vat` clears the stored
    /// VAT-exclusive price, making the new price the source of derivation.
    fn apply(self, product: &mut Product) {
        if let Some(webshop_id) = self.webshop_id {
            product.webshop_id = webshop_id;
        }
        if let Some(structure) = self.structure {
            product.structure = structure;
        }
        if let Some(parent_id) = self.parent_id {
            product.parent_id = parent_id;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(barcode_type) = self.barcode_type {
            product.barcode_type = barcode_type;
        }
        if let Some(barcode) = self.barcode {
            product.barcode = barcode.trim().to_string();
        }
        if let Some(pcs_in_stock) = self.pcs_in_stock {
            product.pcs_in_stock = pcs_in_stock;
        }
        if let Some(vat) = self.vat {
            product.vat = vat;
        }
        if let Some(is_discountable) = self.is_discountable {
            product.is_discountable = is_discountable;
        }

        match (self.price, self.price_excl_vat) {
            (Some(price), None) => {
                product.price = price;
                product.price_excl_vat = None;
            }
            (price, price_excl_vat) => {
                if let Some(price) = price {
                    product.price = price;
                }
                if let Some(price_excl_vat) = price_excl_vat {
                    product.price_excl_vat = price_excl_vat;
                }
            }
        }
    }
}

/// Field and structure rules for a write. Loads the referenced parent.
async fn validate(db: &Database, product: &Product) -> ApiResult<()> {
    validate_price("price", product.price)?;
    validate_price("price_excl_vat", product.price_excl_vat)?;

    let parent = match product.parent_id {
        Some(parent_id) => db.products().get_by_id(parent_id).await?,
        None => None,
    };
    validate_product(product, parent.as_ref())?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Paginated<ProductSummary>>> {
    let filter = query.filter()?;
    let page = query.page(state.config.page_size, state.config.max_page_size);

    let repo = state.db.products();
    let count = repo.count(&filter).await?;
    let products = repo.list(&filter, page).await?;
    let results = summarize(&state.db, products).await?;

    Ok(Json(Paginated::new(count, page.number, page.size, results)))
}

pub async fn ids(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<i64>>> {
    let filter = query.filter()?;
    Ok(Json(state.db.products().ids(&filter).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    let webshop_id = payload.webshop_id.ok_or_else(|| {
        ApiError::from(ValidationError::Required {
            field: "webshop_id".to_string(),
        })
    })?;

    let mut product = Product::new(webshop_id, "");
    payload.apply(&mut product);
    validate(&state.db, &product).await?;

    let saved = state.db.products().save_product(product).await?;
    let id = saved
        .id
        .ok_or_else(|| ApiError::internal("Saved product has no id"))?;
    info!(id, name = %saved.name, structure = ?saved.structure, "Product created");

    Ok((StatusCode::CREATED, Json(load_detail(&state.db, id).await?)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(load_detail(&state.db, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> ApiResult<Json<ProductDetail>> {
    let repo = state.db.products();
    let mut product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let was_parent = product.is_parent();
    let before = product.clone();
    payload.apply(&mut product);
    if product.is_parent() && !was_parent {
        can_be_parent(&before)?;
    }
    validate(&state.db, &product).await?;

    repo.save_product(product).await?;
    info!(id, "Product updated");

    Ok(Json(load_detail(&state.db, id).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.products().delete_product(id).await?;
    info!(id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn stored(price: &str, excl: &str) -> Product {
        let mut p = Product::new(1, "Mat");
        p.id = Some(1);
        p.price = Some(Money::from_str(price).unwrap());
        p.price_excl_vat = Some(Money::from_str(excl).unwrap());
        p
    }

    #[test]
    fn test_price_only_update_clears_excl() {
        let mut p = stored("24.20", "20.00");
        let payload: ProductPayload = serde_json::from_str(r#"{"price": "30.00"}"#).unwrap();
        payload.apply(&mut p);
        assert_eq!(p.price, Some(Money::from_str("30.00").unwrap()));
        assert_eq!(p.price_excl_vat, None);
    }

    #[test]
    fn test_absent_fields_are_kept() {
        let mut p = stored("24.20", "20.00");
        p.category_id = Some(5);
        let payload: ProductPayload =
            serde_json::from_str(r#"{"name": " Big mat ", "barcode": "123"}"#).unwrap();
        payload.apply(&mut p);
        assert_eq!(p.name, "Big mat");
        assert_eq!(p.barcode, "123");
        assert_eq!(p.category_id, Some(5));
        assert_eq!(p.price_excl_vat, Some(Money::from_str("20.00").unwrap()));
    }

    #[test]
    fn test_blank_name_is_trimmed_then_rejected() {
        let mut p = stored("24.20", "20.00");
        let payload: ProductPayload = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        payload.apply(&mut p);
        assert_eq!(p.name, "");
        assert_eq!(
            validate_product(&p, None),
            Err(webshop_core::ValidationError::TitleRequired)
        );
    }

    #[test]
    fn test_null_clears_nullable_fields() {
        let mut p = stored("24.20", "20.00");
        p.category_id = Some(5);
        let payload: ProductPayload =
            serde_json::from_str(r#"{"category_id": null, "pcs_in_stock": null}"#).unwrap();
        payload.apply(&mut p);
        assert_eq!(p.category_id, None);
        assert_eq!(p.pcs_in_stock, None);
    }

    #[test]
    fn test_query_filter_and_page() {
        let query = ProductQuery {
            structure: Some("parent".to_string()),
            default: Some(true),
            page: Some(2),
            page_size: Some(500),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.structure, Some(ProductStructure::Parent));
        assert!(filter.default_only);
        assert_eq!(query.page(9, 100), Page::new(2, 100));
        assert_eq!(ProductQuery::default().page(9, 100), Page::new(1, 9));

        let bad = ProductQuery {
            structure: Some("bundle".to_string()),
            ..Default::default()
        };
        assert!(bad.filter().is_err());
    }
}
