//! Order endpoints.
//!
//! | Method    | Path                    | Action                                   |
//! |-----------|-------------------------|------------------------------------------|
//! | GET       | `/api/order`            | list (id, paid, shipped), `?customer=`   |
//! | POST      | `/api/order`            | create, emails "created"                 |
//! | GET       | `/api/order/{id}`       | detail with line items                   |
//! | PUT/PATCH | `/api/order/{id}`       | update, emails on a paid/shipped change  |
//! | DELETE    | `/api/order/{id}`       | soft delete                              |
//! | POST      | `/api/order/{id}/items` | add a line snapshotting the live product |
//!
//! Emails go out on a background task after the mutation has been stored.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use webshop_core::pricing::line_price_without_vat;
use webshop_core::validation::{validate_email, validate_price};
use webshop_core::{snapshot_line_item, CoreError, Lineage, Money, Order, OrderLineItem, Product, Webshop};
use webshop_db::NewOrder;

use crate::error::{ApiError, ApiResult};
use crate::notify;
use crate::services::{explicit_null, ApiJson};
use crate::AppState;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub customer: Option<i64>,
}

/// Partial order update. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct OrderPatch {
    #[serde(default, deserialize_with = "explicit_null")]
    pub customer_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub webshop_id: Option<Option<i64>>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub email: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub paid: Option<bool>,
    pub shipped: Option<bool>,
    pub subtotal: Option<Money>,
    pub vat: Option<Money>,
    pub total: Option<Money>,
}

impl OrderPatch {
    fn apply(self, order: &mut Order) {
        if let Some(customer_id) = self.customer_id {
            order.customer_id = customer_id;
        }
        if let Some(webshop_id) = self.webshop_id {
            order.webshop_id = webshop_id;
        }
        if let Some(address) = self.address {
            order.address = address;
        }
        if let Some(phone) = self.phone {
            order.phone = phone;
        }
        if let Some(email) = self.email {
            order.email = email;
        }
        if let Some(date) = self.date {
            order.date = date;
        }
        if let Some(paid) = self.paid {
            order.paid = paid;
        }
        if let Some(shipped) = self.shipped {
            order.shipped = shipped;
        }
        if let Some(subtotal) = self.subtotal {
            order.subtotal = subtotal;
        }
        if let Some(vat) = self.vat {
            order.vat = vat;
        }
        if let Some(total) = self.total {
            order.total = total;
        }
    }
}

/// Body of `POST /api/order/{id}/items`.
#[derive(Debug, Deserialize)]
pub struct NewLineItem {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub reserved: bool,
}

fn default_quantity() -> i64 {
    1
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: i64,
    pub paid: bool,
    pub shipped: bool,
}

/// A frozen line with its VAT-exclusive price at the live product's rate.
#[derive(Debug, Serialize)]
pub struct LineItemView {
    #[serde(flatten)]
    pub item: OrderLineItem,
    pub price_without_vat: Money,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub webshop: Option<Webshop>,
    pub items: Vec<LineItemView>,
}

// =============================================================================
// Helpers
// =============================================================================

fn check_contact(order_email: Option<&str>) -> ApiResult<()> {
    match order_email.map(str::trim) {
        Some(email) if !email.is_empty() => Ok(validate_email(email)?),
        _ => Ok(()),
    }
}

fn check_amounts(subtotal: Money, vat: Money, total: Money) -> ApiResult<()> {
    validate_price("subtotal", Some(subtotal))?;
    validate_price("vat", Some(vat))?;
    validate_price("total", Some(total))?;
    Ok(())
}

fn notify_status(state: &AppState, order: &Order) {
    notify::order_status_changed(
        state.db.clone(),
        state.mailer.clone(),
        state.config.no_reply_email.clone(),
        order.clone(),
    );
}

/// Pairs each line with its live product, loading every product once.
///
/// A line whose product is gone keeps its frozen VAT-exclusive price.
async fn line_views(state: &AppState, items: Vec<OrderLineItem>) -> ApiResult<Vec<LineItemView>> {
    let repo = state.db.products();
    let mut products: HashMap<i64, Option<(Product, Option<Product>)>> = HashMap::new();
    for item in &items {
        if !products.contains_key(&item.product_id) {
            products.insert(item.product_id, repo.get_with_parent(item.product_id).await?);
        }
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let price_without_vat = match products.get(&item.product_id).and_then(Option::as_ref) {
                Some((product, parent)) => {
                    line_price_without_vat(&item, Lineage::new(product, parent.as_ref()))
                        .or(item.price_excl_vat)
                        .unwrap_or(item.price)
                }
                None => item.price_excl_vat.unwrap_or(item.price),
            };
            LineItemView {
                item,
                price_without_vat,
            }
        })
        .collect())
}

async fn load_order(state: &AppState, id: i64) -> ApiResult<Order> {
    state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id).into())
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    let orders = state.db.orders().list(query.customer).await?;
    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderSummary {
                id: o.id,
                paid: o.paid,
                shipped: o.shipped,
            })
            .collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    check_contact(new.email.as_deref())?;
    check_amounts(new.subtotal, new.vat, new.total)?;

    let order = state.db.orders().insert(&new).await?;
    info!(id = order.id, customer_id = ?order.customer_id, "Order created");

    notify_status(&state, &order);
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderDetail>> {
    let order = load_order(&state, id).await?;
    let repo = state.db.orders();
    let webshop = repo.get_webshop(&order).await?;
    let items = line_views(&state, repo.items(id).await?).await?;

    Ok(Json(OrderDetail {
        order,
        webshop,
        items,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> ApiResult<Json<Order>> {
    let mut order = load_order(&state, id).await?;
    let (was_paid, was_shipped) = (order.paid, order.shipped);

    patch.apply(&mut order);
    check_contact(order.email.as_deref())?;
    check_amounts(order.subtotal, order.vat, order.total)?;

    let order = state.db.orders().update(&order).await?;
    info!(id, paid = order.paid, shipped = order.shipped, "Order updated");

    if order.paid != was_paid || order.shipped != was_shipped {
        notify_status(&state, &order);
    }
    Ok(Json(order))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.orders().soft_delete(id).await?;
    info!(id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(new): ApiJson<NewLineItem>,
) -> ApiResult<(StatusCode, Json<OrderLineItem>)> {
    let order = load_order(&state, id).await?;
    let (product, parent) = state
        .db
        .products()
        .get_with_parent(new.product_id)
        .await?
        .ok_or(CoreError::ProductNotFound(new.product_id))?;

    let line = snapshot_line_item(
        order.id,
        Lineage::new(&product, parent.as_ref()),
        new.quantity,
        new.reserved,
    )?;
    let item = state.db.orders().add_item(&line).await?;
    info!(order_id = id, product_id = new.product_id, quantity = new.quantity, "Line item added");

    Ok((StatusCode::CREATED, Json(item)))
}
