//! # Error Types
//!
//! Domain-specific error types for webshop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  webshop-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Field and product-structure rule failures      │
//! │                                                                         │
//! │  webshop-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST API errors (in app)                                              │
//! │  └── ApiError         - What HTTP clients see (JSON)                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP 400               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (missing or soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Order cannot be found (missing or soft-deleted).
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Product has no price to snapshot into an order line.
    #[error("Product {0} has no price and cannot be ordered")]
    ProductNotPurchasable(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The structural variants carry the human-readable reason a rejected
/// product write is reported with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount exceeds the largest storable value.
    #[error("{field} must not exceed {max}")]
    TooLarge { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a price that is not a decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Stand-alone and parent products need a name.
    #[error("Your product must have a title.")]
    TitleRequired,

    /// Only children may point at a parent.
    #[error("Only child products can have a parent.")]
    ParentForbidden,

    /// A parent groups variants and is never purchasable itself.
    #[error("A parent product can't have stock records or a price.")]
    ParentHasStockOrPrice,

    #[error("A child product needs a parent.")]
    ChildNeedsParent,

    #[error("You can only assign child products to parent products.")]
    ParentNotParentKind,

    #[error("A child product can't have a category assigned.")]
    ChildHasCategory,

    /// Product cannot become a parent.
    #[error("{0}")]
    CannotBeParent(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
