//! # webshop-db: Database Layer for the Webshop Backend
//!
//! This crate provides database access for the webshop backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Webshop Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (PUT /api/product/{id})                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    webshop-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ WebshopRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CategoryRepo  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ ProductRepo   │    │              │  │   │
//! │  │   │ Management    │    │ OrderRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./data/webshop.db                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (webshop, category, product, order)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use webshop_core::Product;
//! use webshop_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/webshop.db")).await?;
//!
//! // Saving runs price derivation and name propagation
//! let saved = db.products().save_product(Product::new(1, "Yoga mat")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::{CategoryFilter, CategoryRepository, NewCategory};
pub use repository::order::{NewOrder, OrderRepository};
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::webshop::{NewWebshop, WebshopRepository};
pub use repository::Page;
