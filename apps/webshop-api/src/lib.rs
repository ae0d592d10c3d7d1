//! # Webshop API
//!
//! REST server for the webshop catalog and orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Webshop API Services                            │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ WebshopService │  │CategoryService │  │  ProductService            ││
//! │  │                │  │                │  │                            ││
//! │  │ • list/create  │  │ • list/create  │  │ • paginated list, id-only  ││
//! │  │ • detail       │  │ • detail with  │  │ • create/update: validate, ││
//! │  │   (counts)     │  │   children and │  │   derive prices, save      ││
//! │  │ • delete       │  │   products     │  │ • detail (resolved attrs)  ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  OrderService  │  │  HealthService │                                │
//! │  │                │  │                │                                │
//! │  │ • CRUD + items │  │ • GET /health  │                                │
//! │  │ • status email │  │                │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────┐  ┌──────────────────────────────────────────┐  │  │
//! │  │  │   SQLite     │  │  Mailer (fire-and-forget notifications)  │  │  │
//! │  │  │  webshop-db  │  │                                          │  │  │
//! │  │  └──────────────┘  └──────────────────────────────────────────┘  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the `WEBSHOP_*` environment variables.

pub mod config;
pub mod error;
pub mod notify;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use webshop_db::Database;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use notify::{LogMailer, Mailer, MemoryMailer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, mailer: Arc<dyn Mailer>) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            mailer,
        }
    }
}

/// Builds the HTTP router with every endpoint.
pub fn build_router(state: AppState) -> Router {
    use services::{category_service, health_service, order_service, product_service, webshop_service};

    Router::new()
        .route("/health", get(health_service::health_handler))
        // Webshops
        .route(
            "/api/webshop",
            get(webshop_service::list).post(webshop_service::create),
        )
        .route(
            "/api/webshop/{id}",
            get(webshop_service::detail).delete(webshop_service::delete),
        )
        // Categories
        .route(
            "/api/category",
            get(category_service::list).post(category_service::create),
        )
        .route(
            "/api/category/{id}",
            get(category_service::detail).delete(category_service::delete),
        )
        // Products
        .route(
            "/api/product",
            get(product_service::list).post(product_service::create),
        )
        .route(
            "/api/product/{id}",
            get(product_service::detail)
                .put(product_service::update)
                .patch(product_service::update)
                .delete(product_service::delete),
        )
        .route("/api/idonly/product", get(product_service::ids))
        // Orders
        .route(
            "/api/order",
            get(order_service::list).post(order_service::create),
        )
        .route(
            "/api/order/{id}",
            get(order_service::detail)
                .put(order_service::update)
                .patch(order_service::update)
                .delete(order_service::delete),
        )
        .route("/api/order/{id}/items", post(order_service::add_item))
        .with_state(state)
}
