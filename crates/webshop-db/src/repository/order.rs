//! # Order Repository
//!
//! Database operations for orders and order line items.
//!
//! ## Snapshot Pattern
//! Line items copy the product's title, price and description when they are
//! added. Later product edits never change an existing order.
//! ```text
//! Product "Yoga mat" @ 24.20 ──add_item──► line: "Yoga mat" @ 24.20 (frozen)
//! Product renamed, repriced  ──────────►  line unchanged
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::webshop::WebshopRepository;
use crate::repository::{decode_money, decode_required_money, encode_money};
use webshop_core::{Money, NewOrderLineItem, Order, OrderLineItem, Webshop};

const ORDER_COLUMNS: &str = "id, customer_id, webshop_id, address, phone, email, date, \
     paid, shipped, subtotal, vat, total, deleted_at";

const LINE_ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, reserved, name, price, price_excl_vat, description";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: Option<i64>,
    webshop_id: Option<i64>,
    address: String,
    phone: Option<String>,
    email: Option<String>,
    date: DateTime<Utc>,
    paid: bool,
    shipped: bool,
    subtotal: String,
    vat: String,
    total: String,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            id: row.id,
            customer_id: row.customer_id,
            webshop_id: row.webshop_id,
            address: row.address,
            phone: row.phone,
            email: row.email,
            date: row.date,
            paid: row.paid,
            shipped: row.shipped,
            subtotal: decode_required_money("subtotal", row.subtotal)?,
            vat: decode_required_money("vat", row.vat)?,
            total: decode_required_money("total", row.total)?,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    reserved: bool,
    name: String,
    price: String,
    price_excl_vat: Option<String>,
    description: String,
}

impl TryFrom<LineItemRow> for OrderLineItem {
    type Error = DbError;

    fn try_from(row: LineItemRow) -> DbResult<Self> {
        Ok(OrderLineItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            reserved: row.reserved,
            name: row.name,
            price: decode_required_money("price", row.price)?,
            price_excl_vat: decode_money("price_excl_vat", row.price_excl_vat)?,
            description: row.description,
        })
    }
}

// =============================================================================
// Input
// =============================================================================

/// Input for creating an order. Totals are taken as given.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub webshop_id: Option<i64>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub shipped: bool,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub vat: Money,
    #[serde(default)]
    pub total: Money,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Lists non-deleted orders, optionally for one customer. Newest first.
    pub async fn list(&self, customer_id: Option<i64>) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE deleted_at IS NULL AND (?1 IS NULL OR customer_id = ?1) \
             ORDER BY date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Gets an order by ID. Soft-deleted orders are not returned.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Inserts a new order.
    pub async fn insert(&self, new: &NewOrder) -> DbResult<Order> {
        debug!(customer_id = ?new.customer_id, total = %new.total, "Inserting order");

        let date = new.date.unwrap_or_else(Utc::now);
        let id = sqlx::query(
            r#"
            INSERT INTO orders (
                customer_id, webshop_id, address, phone, email, date,
                paid, shipped, subtotal, vat, total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(new.customer_id)
        .bind(new.webshop_id)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(date)
        .bind(new.paid)
        .bind(new.shipped)
        .bind(new.subtotal.to_storage_string())
        .bind(new.vat.to_storage_string())
        .bind(new.total.to_storage_string())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Writes every mutable field of the order.
    pub async fn update(&self, order: &Order) -> DbResult<Order> {
        debug!(id = order.id, paid = order.paid, shipped = order.shipped, "Updating order");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET
                customer_id = ?2,
                webshop_id = ?3,
                address = ?4,
                phone = ?5,
                email = ?6,
                date = ?7,
                paid = ?8,
                shipped = ?9,
                subtotal = ?10,
                vat = ?11,
                total = ?12
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.webshop_id)
        .bind(&order.address)
        .bind(&order.phone)
        .bind(&order.email)
        .bind(order.date)
        .bind(order.paid)
        .bind(order.shipped)
        .bind(order.subtotal.to_storage_string())
        .bind(order.vat.to_storage_string())
        .bind(order.total.to_storage_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order.id));
        }

        self.get_by_id(order.id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order.id))
    }

    /// Soft-deletes an order. Its line items stay as they are.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting order");

        let result = sqlx::query(
            "UPDATE orders SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Appends a snapshotted line item to an order.
    ///
    /// Build the snapshot with `webshop_core::snapshot_line_item` so the
    /// frozen title and price come from the live product.
    pub async fn add_item(&self, item: &NewOrderLineItem) -> DbResult<OrderLineItem> {
        debug!(
            order_id = item.order_id,
            product_id = item.product_id,
            quantity = item.quantity,
            "Adding order line item"
        );

        let id = sqlx::query(
            r#"
            INSERT INTO order_line_items (
                order_id, product_id, quantity, reserved,
                name, price, price_excl_vat, description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.reserved)
        .bind(&item.name)
        .bind(item.price.to_storage_string())
        .bind(encode_money(item.price_excl_vat))
        .bind(&item.description)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let sql = format!("SELECT {LINE_ITEM_COLUMNS} FROM order_line_items WHERE id = ?1");
        let row = sqlx::query_as::<_, LineItemRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        OrderLineItem::try_from(row)
    }

    /// Line items of an order, in insertion order.
    pub async fn items(&self, order_id: i64) -> DbResult<Vec<OrderLineItem>> {
        let sql = format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM order_line_items WHERE order_id = ?1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, LineItemRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(OrderLineItem::try_from).collect()
    }

    /// The order's webshop, or else the webshop of the product on its first
    /// line item.
    pub async fn get_webshop(&self, order: &Order) -> DbResult<Option<Webshop>> {
        let webshop_id = match order.webshop_id {
            Some(id) => Some(id),
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT p.webshop_id FROM order_line_items i \
                     JOIN products p ON p.id = i.product_id \
                     WHERE i.order_id = ?1 ORDER BY i.id LIMIT 1",
                )
                .bind(order.id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match webshop_id {
            Some(id) => WebshopRepository::new(self.pool.clone()).get_by_id(id).await,
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
