//! # Domain Types
//!
//! Core domain types used throughout the webshop backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐  1   n  ┌─────────────┐  1   n  ┌─────────────────┐   │
//! │  │   Webshop   │────────►│  Category   │────────►│    Product      │   │
//! │  │  ─────────  │         │  ─────────  │         │  ─────────────  │   │
//! │  │  active     │         │  parent? ─┐ │         │  structure      │   │
//! │  │  name       │         │  ◄────────┘ │         │  parent?  ─┐    │   │
//! │  └─────────────┘         └─────────────┘         │  ◄─────────┘    │   │
//! │                                                  │  price / excl   │   │
//! │                                                  │  vat            │   │
//! │                                                  └────────▲────────┘   │
//! │  ┌─────────────┐  1   n  ┌─────────────────┐              │ (by id)    │
//! │  │    Order    │────────►│  OrderLineItem  │──────────────┘            │
//! │  │  paid       │         │  frozen name,   │                           │
//! │  │  shipped    │         │  price, qty     │                           │
//! │  └─────────────┘         └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is soft-deleted: `deleted_at` is set instead of removing the row.
//! Parent links are plain ids. A parent product does not own its children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Webshop
// =============================================================================

/// A storefront owning categories and products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Webshop {
    pub id: i64,
    /// Toggles storefront visibility only. Does not cascade.
    pub active: bool,
    pub name: String,
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. May hang under one parent category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub webshop_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Product Structure
// =============================================================================

/// Variant kind of a product.
///
/// ```text
/// STANDALONE   a regular product living by itself
/// PARENT       a grouping record (e.g. "Yoga course"), never purchasable
/// CHILD        one variant of a PARENT (e.g. "Yoga course, Monday 18:00")
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ProductStructure {
    #[default]
    Standalone = 0,
    Parent = 1,
    Child = 2,
}

impl ProductStructure {
    /// Parses the wire name used in query strings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standalone" | "0" => Some(ProductStructure::Standalone),
            "parent" | "1" => Some(ProductStructure::Parent),
            "child" | "2" => Some(ProductStructure::Child),
            _ => None,
        }
    }
}

// =============================================================================
// VAT Rate
// =============================================================================

/// The closed set of VAT rates a product may carry.
///
/// Serialized as the integer percentage (`0`, `6`, `21`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(try_from = "u32", into = "u32")]
#[repr(i32)]
pub enum VatRate {
    Zero = 0,
    #[default]
    Low = 6,
    High = 21,
}

impl VatRate {
    /// Every allowed rate, lowest first.
    pub const ALL: [VatRate; 3] = [VatRate::Zero, VatRate::Low, VatRate::High];

    /// The rate as an integer percentage.
    #[inline]
    pub const fn percent(&self) -> u32 {
        *self as u32
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        matches!(self, VatRate::Zero)
    }
}

impl TryFrom<u32> for VatRate {
    type Error = ValidationError;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        VatRate::ALL
            .into_iter()
            .find(|rate| rate.percent() == percent)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "vat".to_string(),
                allowed: VatRate::ALL.iter().map(|r| r.percent().to_string()).collect(),
            })
    }
}

impl From<VatRate> for u32 {
    fn from(rate: VatRate) -> Self {
        rate.percent()
    }
}

// =============================================================================
// Barcode Type
// =============================================================================

/// Symbology of a product barcode. `NoBarcode` means no type was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(try_from = "u32", into = "u32")]
#[repr(i32)]
pub enum BarcodeType {
    #[default]
    NoBarcode = 0,
    Code128 = 1,
    Ean = 2,
    Ean8 = 3,
    Code39 = 4,
    Code39Vin = 5,
    Codabar = 6,
    Upc = 7,
    UpcE = 8,
    Interleaved2of5 = 9,
    Standard2of5 = 10,
    Code93 = 11,
}

impl BarcodeType {
    pub const ALL: [BarcodeType; 12] = [
        BarcodeType::NoBarcode,
        BarcodeType::Code128,
        BarcodeType::Ean,
        BarcodeType::Ean8,
        BarcodeType::Code39,
        BarcodeType::Code39Vin,
        BarcodeType::Codabar,
        BarcodeType::Upc,
        BarcodeType::UpcE,
        BarcodeType::Interleaved2of5,
        BarcodeType::Standard2of5,
        BarcodeType::Code93,
    ];

    #[inline]
    pub const fn code(&self) -> u32 {
        *self as u32
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, BarcodeType::NoBarcode)
    }
}

impl TryFrom<u32> for BarcodeType {
    type Error = ValidationError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        BarcodeType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "barcode_type".to_string(),
                min: 0,
                max: BarcodeType::Code93.code() as i64,
            })
    }
}

impl From<BarcodeType> for u32 {
    fn from(barcode_type: BarcodeType) -> Self {
        barcode_type.code()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product (stand-alone, parent, or child variant).
///
/// `id` is `None` until the product has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub webshop_id: i64,
    pub structure: ProductStructure,
    pub parent_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Mandatory for stand-alone and parent products, optional for children.
    pub name: String,
    pub description: String,
    pub active: bool,
    /// Displayed on the front page of the shop.
    pub featured: bool,
    pub barcode_type: BarcodeType,
    pub barcode: String,
    pub pcs_in_stock: Option<u32>,
    /// Price including VAT.
    pub price: Option<Money>,
    /// Price excluding VAT.
    pub price_excl_vat: Option<Money>,
    pub vat: VatRate,
    /// Whether the product may be used in an offer. Ignored for children,
    /// which inherit it from their parent.
    pub is_discountable: bool,
    pub added_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// A new, unsaved product with the catalog defaults.
    pub fn new(webshop_id: i64, name: impl Into<String>) -> Self {
        Product {
            id: None,
            webshop_id,
            structure: ProductStructure::Standalone,
            parent_id: None,
            category_id: None,
            name: name.into(),
            description: String::new(),
            active: true,
            featured: true,
            barcode_type: BarcodeType::NoBarcode,
            barcode: String::new(),
            pcs_in_stock: None,
            price: None,
            price_excl_vat: None,
            vat: VatRate::default(),
            is_discountable: true,
            added_at: None,
            modified_at: None,
            deleted_at: None,
        }
    }

    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    #[inline]
    pub fn is_standalone(&self) -> bool {
        self.structure == ProductStructure::Standalone
    }

    #[inline]
    pub fn is_parent(&self) -> bool {
        self.structure == ProductStructure::Parent
    }

    #[inline]
    pub fn is_child(&self) -> bool {
        self.structure == ProductStructure::Child
    }

    /// True when any stock is recorded (`pcs_in_stock > 0`).
    #[inline]
    pub fn has_stockrecords(&self) -> bool {
        self.pcs_in_stock.unwrap_or(0) > 0
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order. Totals are stored as entered, not derived from items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub webshop_id: Option<i64>,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date: DateTime<Utc>,
    pub paid: bool,
    pub shipped: bool,
    pub subtotal: Money,
    pub vat: Money,
    pub total: Money,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Which status email an order currently warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Paid,
    Shipped,
}

impl Order {
    /// Status used for notifications: paid wins over shipped.
    pub fn status(&self) -> OrderStatus {
        if self.paid {
            OrderStatus::Paid
        } else if self.shipped {
            OrderStatus::Shipped
        } else {
            OrderStatus::Created
        }
    }
}

// =============================================================================
// Order Line Item
// =============================================================================

/// A line in an order.
/// Uses snapshot pattern to freeze product data at time of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reserved: bool,
    /// Product title at time of order (frozen).
    pub name: String,
    /// Unit price incl. VAT at time of order (frozen).
    pub price: Money,
    /// Unit price excl. VAT at time of order (frozen).
    pub price_excl_vat: Option<Money>,
    /// Product description at time of order (frozen).
    pub description: String,
}

/// A line item about to be inserted, with its snapshot already taken.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLineItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reserved: bool,
    pub name: String,
    pub price: Money,
    pub price_excl_vat: Option<Money>,
    pub description: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
