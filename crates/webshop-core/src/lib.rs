//! # webshop-core: Pure Business Logic for the Webshop Backend
//!
//! This crate is the **heart** of the webshop backend. It contains the
//! catalog and order rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Webshop Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 webshop-api (axum REST server)                  │   │
//! │  │   /api/product  /api/category  /api/order  /api/webshop         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ webshop-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Lineage  │  │ structure │  │   │
//! │  │   │   Order   │  │  VAT math │  │  derive   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  webshop-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Webshop, Category, Product, Order, ...)
//! - [`money`] - Exact-decimal Money with VAT helpers
//! - [`pricing`] - Price derivation and parent/child inheritance
//! - [`validation`] - Product structure and field rules
//! - [`notification`] - Order status email composition
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use std::str::FromStr;
//! use webshop_core::money::Money;
//! use webshop_core::pricing::derive_prices;
//! use webshop_core::types::{Product, VatRate};
//!
//! let mut tea = Product::new(1, "Green tea");
//! tea.vat = VatRate::Low;
//! tea.price_excl_vat = Some(Money::from_str("1.3456").unwrap());
//!
//! derive_prices(&mut tea, None).unwrap();
//! assert_eq!(tea.price.unwrap().to_string(), "1.43");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod notification;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{derive_prices, snapshot_line_item, Lineage};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single order line.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Default number of products per page in listings.
pub const DEFAULT_PAGE_SIZE: u32 = 9;
