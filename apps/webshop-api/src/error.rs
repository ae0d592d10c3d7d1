//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Webshop API                        │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Missing row? ──────── DbError::NotFound ─────────┐   404 NOT_FOUND     │
//! │  Bad reference? ────── DbError::ForeignKey ───────┤   400 VALIDATION    │
//! │  Structure rule? ───── ValidationError ───────────┼─► ApiError ──► JSON │
//! │  Storage failure? ──── DbError::QueryFailed ──────┘   500 DATABASE      │
//! │                        (details logged, not sent)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "code": "VALIDATION_ERROR", "message": "A child product needs a parent." }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use webshop_core::{CoreError, ValidationError};
use webshop_db::DbError;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status the code is sent with.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
///
/// Storage failures are logged with their details and reported with a
/// generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Rejected write with a dangling reference");
                ApiError::validation("Invalid reference")
            }
            DbError::ConstraintViolation { message } => {
                warn!(%message, "Rejected write violating a constraint");
                ApiError::validation("Invalid value")
            }
            DbError::Validation(e) => ApiError::from(e),
            other => {
                error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", id),
            CoreError::ProductNotPurchasable(_) => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err = ApiError::from(DbError::not_found("Product", 7));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: 7");

        let err = ApiError::from(DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Invalid reference");

        let err = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_validation_messages_pass_through() {
        let err = ApiError::from(CoreError::from(ValidationError::ChildNeedsParent));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "A child product needs a parent.");
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_validation_keeps_its_message() {
        let err = ApiError::from(DbError::from(ValidationError::TooLarge {
            field: "price".to_string(),
            max: "999999.99".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "price must not exceed 999999.99");
    }

    #[test]
    fn test_serialized_code() {
        let json = serde_json::to_value(ApiError::not_found("Order", 3)).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: 3");
    }
}
