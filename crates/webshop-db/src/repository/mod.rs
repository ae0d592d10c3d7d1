//! # Repository Module
//!
//! Database repository implementations for the webshop.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().save_product(product)                           │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id / get_with_parent                                       │
//! │  ├── list(filter, page) / count(filter) / ids(filter)                  │
//! │  ├── save_product(product)   ← derive prices, write, propagate name    │
//! │  └── delete_product(id)      ← soft delete, demote empty parent        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every default read excludes soft-deleted rows (`deleted_at IS NULL`).
//!
//! ## Available Repositories
//!
//! - [`webshop::WebshopRepository`] - Webshops and their product/category counts
//! - [`category::CategoryRepository`] - Category tree and category products
//! - [`product::ProductRepository`] - Product persistence pipeline and listings
//! - [`order::OrderRepository`] - Orders and snapshotted line items

pub mod category;
pub mod order;
pub mod product;
pub mod webshop;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use webshop_core::{Money, DEFAULT_PAGE_SIZE};

use crate::error::{DbError, DbResult};

// =============================================================================
// Pagination
// =============================================================================

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Creates a page request. Page 0 is treated as page 1, size 0 as 1.
    pub fn new(number: u32, size: u32) -> Self {
        Page {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, DEFAULT_PAGE_SIZE)
    }
}

// =============================================================================
// Money Columns
// =============================================================================
//
// SQLite has no decimal type. Prices live in TEXT columns holding the exact
// decimal notation, so nothing is lost between writes and reads.

pub(crate) fn encode_money(value: Option<Money>) -> Option<String> {
    value.map(|m| m.to_storage_string())
}

pub(crate) fn decode_money(column: &str, raw: Option<String>) -> DbResult<Option<Money>> {
    raw.map(|s| decode_required_money(column, s)).transpose()
}

pub(crate) fn decode_required_money(column: &str, raw: String) -> DbResult<Money> {
    Money::from_str(&raw).map_err(|_| DbError::corrupt(column, raw))
}
