//! # Pricing & Inheritance
//!
//! Price derivation and parent/child attribute resolution for products.
//!
//! ## Price Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  derive_prices() runs before EVERY product write                        │
//! │                                                                         │
//! │  price_excl_vat set?  ── yes ──► price = round(excl × (100+vat)/100, 2) │
//! │         │                        (kept when the pair is already derived)│
//! │         │                                                               │
//! │         no                                                              │
//! │         ▼                                                               │
//! │  price set?           ── yes ──► excl  = round(100 × price/(100+vat), 2)│
//! │         │                                                               │
//! │         no ──► both stay unset                                          │
//! │                                                                         │
//! │  vat = EFFECTIVE rate (a child uses its parent's)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inheritance
//! ```text
//! attribute          CHILD resolves to
//! ─────────────────  ─────────────────────────────────────────
//! price              parent's, always
//! vat                parent's, always
//! is_discountable    parent's, always
//! category           parent's, always
//! barcode            own if non-empty, else parent's
//! barcode_type       own if set, else parent's
//! ```
//! The barcode rule differs on purpose: a variant may carry its own physical
//! code, but it has no commercial identity of its own.
//!
//! Delegation is a single hop. A parent is never asked for *its* parent.

use serde::Serialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, MAX_PRICE};
use crate::types::{BarcodeType, NewOrderLineItem, OrderLineItem, Product, VatRate};
use crate::validation::validate_quantity;

// =============================================================================
// Lineage
// =============================================================================

/// A product viewed together with its parent, for resolving inherited values.
///
/// The parent is looked up by the caller (usually the store). If a CHILD's
/// parent is missing, every accessor falls back to the product's own field.
#[derive(Debug, Clone, Copy)]
pub struct Lineage<'a> {
    product: &'a Product,
    parent: Option<&'a Product>,
}

impl<'a> Lineage<'a> {
    pub fn new(product: &'a Product, parent: Option<&'a Product>) -> Self {
        Lineage { product, parent }
    }

    /// A product with no parent loaded.
    pub fn standalone(product: &'a Product) -> Self {
        Lineage {
            product,
            parent: None,
        }
    }

    pub fn product(&self) -> &'a Product {
        self.product
    }

    pub fn parent(&self) -> Option<&'a Product> {
        self.parent
    }

    /// The product values are delegated to, if any.
    fn delegate(&self) -> Option<&'a Product> {
        if self.product.is_child() {
            self.parent
        } else {
            None
        }
    }

    /// Effective VAT-inclusive price.
    pub fn price(&self) -> Option<Money> {
        match self.delegate() {
            Some(parent) => parent.price,
            None => self.product.price,
        }
    }

    /// Effective VAT rate.
    pub fn vat(&self) -> VatRate {
        match self.delegate() {
            Some(parent) => parent.vat,
            None => self.product.vat,
        }
    }

    /// Effective discountability.
    pub fn is_discountable(&self) -> bool {
        match self.delegate() {
            Some(parent) => parent.is_discountable,
            None => self.product.is_discountable,
        }
    }

    /// Effective category id.
    pub fn category_id(&self) -> Option<i64> {
        match self.delegate() {
            Some(parent) => parent.category_id,
            None => self.product.category_id,
        }
    }

    /// Own barcode when non-empty, else the parent's, else empty.
    pub fn barcode(&self) -> &'a str {
        if !self.product.barcode.is_empty() {
            return &self.product.barcode;
        }
        self.delegate().map(|p| p.barcode.as_str()).unwrap_or("")
    }

    /// Own barcode type when set, else the parent's, else none.
    pub fn barcode_type(&self) -> BarcodeType {
        if !self.product.barcode_type.is_none() {
            return self.product.barcode_type;
        }
        self.delegate()
            .map(|p| p.barcode_type)
            .unwrap_or(BarcodeType::NoBarcode)
    }

    /// Own name, or the parent's name when the own name is empty.
    pub fn title(&self) -> &'a str {
        if self.product.name.is_empty() {
            if let Some(parent) = self.parent {
                return &parent.name;
            }
        }
        &self.product.name
    }

    /// Effective price with VAT removed, for display.
    ///
    /// Returns the effective price unchanged when the rate is zero.
    pub fn price_without_vat(&self) -> Option<Money> {
        let price = self.price()?;
        let vat = self.vat();
        if vat.is_zero() {
            return Some(price);
        }
        price.remove_vat(vat.percent())
    }

    /// VAT contained in the effective price, `None` at a zero rate or price.
    pub fn vat_amount(&self) -> Option<Money> {
        let vat = self.vat();
        let price = self.price()?;
        if vat.is_zero() || price.is_zero() {
            return None;
        }
        price.vat_portion(vat.percent())
    }

    /// Stock shown to shoppers: a child shows its parent's recorded stock.
    pub fn available_qty_in_stock(&self) -> Option<u32> {
        if self.product.is_child() {
            if let Some(stock) = self.parent.and_then(|p| p.pcs_in_stock) {
                return Some(stock);
            }
        }
        self.product.pcs_in_stock
    }

    /// Resolves one inheritable attribute.
    pub fn resolve(&self, attribute: Attribute) -> AttributeValue {
        match attribute {
            Attribute::Price => AttributeValue::Price(self.price()),
            Attribute::Vat => AttributeValue::Vat(self.vat()),
            Attribute::Barcode => AttributeValue::Barcode(self.barcode().to_string()),
            Attribute::BarcodeType => AttributeValue::BarcodeType(self.barcode_type()),
            Attribute::Category => AttributeValue::Category(self.category_id()),
            Attribute::Discountable => AttributeValue::Discountable(self.is_discountable()),
        }
    }
}

/// Attributes a child inherits from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Price,
    Vat,
    Barcode,
    BarcodeType,
    Category,
    Discountable,
}

/// A resolved attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Price(Option<Money>),
    Vat(VatRate),
    Barcode(String),
    BarcodeType(BarcodeType),
    Category(Option<i64>),
    Discountable(bool),
}

// =============================================================================
// Price Derivation
// =============================================================================

/// Recomputes the non-authoritative price field in place.
///
/// `price_excl_vat` wins when both are set, unless the pair already is the
/// result of a derivation in either direction: then it is left as is, so a
/// price-sourced pair does not drift on the next save (100.00 at 21% gives
/// 82.64, and 82.64 would give back 99.99). Arithmetic is exact decimal,
/// rounding half-up to cents. A derived price too large to represent is
/// rejected as `TooLarge` and leaves the product untouched.
///
/// ## Example
/// ```rust
/// use std::str::FromStr;
/// use webshop_core::money::Money;
/// use webshop_core::pricing::derive_prices;
/// use webshop_core::types::{Product, VatRate};
///
/// let mut p = Product::new(1, "Mat");
/// p.vat = VatRate::High;
/// p.price = Some(Money::from_str("100.00").unwrap());
/// derive_prices(&mut p, None).unwrap();
/// assert_eq!(p.price_excl_vat.unwrap().to_string(), "82.64");
/// ```
pub fn derive_prices(
    product: &mut Product,
    parent: Option<&Product>,
) -> Result<(), ValidationError> {
    let vat = Lineage::new(product, parent).vat().percent();
    let too_large = |field: &str| ValidationError::TooLarge {
        field: field.to_string(),
        max: MAX_PRICE.to_string(),
    };

    match (product.price, product.price_excl_vat) {
        (Some(price), Some(excl)) => {
            let from_excl = excl.add_vat(vat).ok_or_else(|| too_large("price"))?;
            let derived_from_price = price.remove_vat(vat) == Some(excl);
            if price != from_excl && !derived_from_price {
                product.price = Some(from_excl);
            }
        }
        (None, Some(excl)) => {
            product.price = Some(excl.add_vat(vat).ok_or_else(|| too_large("price"))?);
        }
        (Some(price), None) => {
            product.price_excl_vat =
                Some(price.remove_vat(vat).ok_or_else(|| too_large("price_excl_vat"))?);
        }
        (None, None) => {}
    }
    Ok(())
}

/// Lowest effective price over a parent's active, non-deleted children.
///
/// A child without a price counts as zero. `None` when no child qualifies.
pub fn children_min_price(parent: &Product, children: &[Product]) -> Option<Money> {
    children
        .iter()
        .filter(|child| child.active && !child.is_deleted())
        .map(|child| {
            Lineage::new(child, Some(parent))
                .price()
                .unwrap_or_else(Money::zero)
        })
        .min()
}

/// Checks whether a product may be turned into a parent product.
pub fn can_be_parent(product: &Product) -> Result<(), ValidationError> {
    if product.is_child() {
        return Err(ValidationError::CannotBeParent(
            "The specified parent product is a child product.".to_string(),
        ));
    }
    if product.has_stockrecords() {
        return Err(ValidationError::CannotBeParent(
            "One can't add a child product to a product with stock records.".to_string(),
        ));
    }
    Ok(())
}

/// Frozen line price with VAT removed at the live product's effective rate.
///
/// `None` only when the frozen price is too large to divide out.
pub fn line_price_without_vat(item: &OrderLineItem, product: Lineage<'_>) -> Option<Money> {
    let vat = product.vat();
    if vat.is_zero() || item.price.is_zero() {
        return Some(item.price);
    }
    item.price.remove_vat(vat.percent())
}

/// Freezes a product's current title and price into a new order line.
///
/// The effective price is used. A variant whose parent carries no price
/// falls back to its own stored price; with neither, the product cannot be
/// ordered.
pub fn snapshot_line_item(
    order_id: i64,
    product: Lineage<'_>,
    quantity: i64,
    reserved: bool,
) -> CoreResult<NewOrderLineItem> {
    validate_quantity(quantity)?;

    let own = product.product();
    let product_id = own.id.ok_or_else(|| ValidationError::Required {
        field: "product".to_string(),
    })?;

    let (price, price_excl_vat) = match product.price() {
        Some(price) => (price, product.price_without_vat()),
        None => (
            own.price
                .ok_or(CoreError::ProductNotPurchasable(product_id))?,
            own.price_excl_vat,
        ),
    };

    Ok(NewOrderLineItem {
        order_id,
        product_id,
        quantity,
        reserved,
        name: product.title().to_string(),
        price: price.round_to_cents(),
        price_excl_vat: price_excl_vat.map(|m| m.round_to_cents()),
        description: own.description.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
