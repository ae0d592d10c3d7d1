//! Health check endpoint for monitoring and load balancers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use crate::AppState;

/// `GET /health`: `200 OK` while the database answers.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    }
}
