//! # Validation Module
//!
//! Input validation for the webshop backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: REST handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules + product structure rules                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Persistence (webshop-db)                                     │
//! │  ├── derive_prices / name propagation / demotion                       │
//! │  └── NO structure validation: bulk writes bypass it                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Product Rules
//! ```text
//! +-------------+-------------+-------------+---------------------+
//! |             | stand alone | parent      | child               |
//! +-------------+-------------+-------------+---------------------+
//! | title       | required    | required    | optional            |
//! | parent      | forbidden   | forbidden   | required, a PARENT  |
//! | stock/price | any         | forbidden   | any                 |
//! | category    | any         | any         | forbidden once saved|
//! +-------------+-------------+-------------+---------------------+
//! ```

use crate::error::ValidationError;
use crate::money::{Money, MAX_PRICE};
use crate::types::{Product, ProductStructure};
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Product Structure Validation
// =============================================================================

/// Validates a product against the rules of its structure.
///
/// `parent` is the product referenced by `product.parent_id`, as loaded by
/// the caller. This is advisory: the persistence path never calls it.
///
/// ## Example
/// ```rust
/// use webshop_core::types::{Product, ProductStructure};
/// use webshop_core::validation::validate_product;
///
/// let mut child = Product::new(1, "Size M");
/// child.structure = ProductStructure::Child;
/// assert!(validate_product(&child, None).is_err());
/// ```
pub fn validate_product(product: &Product, parent: Option<&Product>) -> ValidationResult<()> {
    match product.structure {
        ProductStructure::Standalone => validate_standalone(product),
        ProductStructure::Parent => validate_parent(product),
        ProductStructure::Child => validate_child(product, parent),
    }
}

fn validate_standalone(product: &Product) -> ValidationResult<()> {
    if product.name.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if product.parent_id.is_some() {
        return Err(ValidationError::ParentForbidden);
    }
    Ok(())
}

fn validate_parent(product: &Product) -> ValidationResult<()> {
    validate_standalone(product)?;

    let priced = |price: Option<Money>| price.is_some_and(|p| !p.is_zero());
    let has_price = priced(product.price) || priced(product.price_excl_vat);
    if product.has_stockrecords() || has_price {
        return Err(ValidationError::ParentHasStockOrPrice);
    }
    Ok(())
}

fn validate_child(product: &Product, parent: Option<&Product>) -> ValidationResult<()> {
    if product.parent_id.is_none() {
        return Err(ValidationError::ChildNeedsParent);
    }
    match parent {
        Some(parent) if parent.is_parent() => {}
        _ => return Err(ValidationError::ParentNotParentKind),
    }
    if product.is_persisted() && product.category_id.is_some() {
        return Err(ValidationError::ChildHasCategory);
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (webshop, category).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Loose email check for order contact addresses.
///
/// ## Rules
/// - One `@` with a non-empty local part
/// - Domain contains a dot
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or order amount.
///
/// Zero is allowed (free items), negatives are not, and nothing may exceed
/// `MAX_PRICE`.
pub fn validate_price(field: &str, price: Option<Money>) -> ValidationResult<()> {
    match price {
        Some(p) if p.is_negative() => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }),
        Some(p) if p > MAX_PRICE => Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_PRICE.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
