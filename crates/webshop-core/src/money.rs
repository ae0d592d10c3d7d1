//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    100 / 1.21 = 82.64462809917355   (binary approximation)              │
//! │    0.1 + 0.2  = 0.30000000000000004 ❌                                  │
//! │                                                                         │
//! │  Merchants enter prices like 1.3456 excl. VAT, so integer cents are    │
//! │  not enough either. We keep the exact base-10 value and only round     │
//! │  (half-up, to cents) where a price is DERIVED.                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Money always serializes as a fixed two-decimal string (`"82.64"`).
//! It deserializes from strings or JSON numbers.
//!
//! ## Usage
//! ```rust
//! use std::str::FromStr;
//! use webshop_core::money::Money;
//!
//! let price = Money::from_str("100.00").unwrap();
//! let excl = price.remove_vat(21).unwrap();
//! assert_eq!(excl.to_string(), "82.64");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Number of decimal places a derived price is rounded to.
pub const CENT_PLACES: u32 = 2;

/// Largest amount a price or order total may hold (8 digits, 2 decimals).
pub const MAX_PRICE: Money = Money(Decimal::from_parts(99_999_999, 0, 0, false, CENT_PLACES));

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal, not f64**: no cent-level drift from binary fractions
/// - **Full input precision**: `1.3456` stays `1.3456` until something is derived from it
/// - **Half-up rounding**: `0.125` rounds to `0.13`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal value.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a value from whole cents.
    ///
    /// ## Example
    /// ```rust
    /// use webshop_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CENT_PLACES))
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds half-up (away from zero on a tie) to whole cents.
    ///
    /// ## Example
    /// ```rust
    /// use std::str::FromStr;
    /// use webshop_core::money::Money;
    ///
    /// assert_eq!(Money::from_str("0.125").unwrap().round_to_cents().to_string(), "0.13");
    /// assert_eq!(Money::from_str("1.42629").unwrap().round_to_cents().to_string(), "1.43");
    /// ```
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Adds a VAT percentage to a VAT-exclusive amount.
    ///
    /// `round(amount * (100 + vat) / 100, 2)`, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use std::str::FromStr;
    /// use webshop_core::money::Money;
    ///
    /// let excl = Money::from_str("1.3456").unwrap();
    /// assert_eq!(excl.add_vat(6).unwrap().to_string(), "1.43");
    /// ```
    pub fn add_vat(&self, vat_percent: u32) -> Option<Money> {
        let factor = Decimal::from(100 + vat_percent);
        self.0
            .checked_mul(factor)?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(|amount| Money(amount).round_to_cents())
    }

    /// Removes a VAT percentage from a VAT-inclusive amount.
    ///
    /// `round(100 * amount / (100 + vat), 2)`, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use std::str::FromStr;
    /// use webshop_core::money::Money;
    ///
    /// let incl = Money::from_str("100.00").unwrap();
    /// assert_eq!(incl.remove_vat(21).unwrap().to_string(), "82.64");
    /// ```
    pub fn remove_vat(&self, vat_percent: u32) -> Option<Money> {
        let divisor = Decimal::from(100 + vat_percent);
        Decimal::ONE_HUNDRED
            .checked_mul(self.0)?
            .checked_div(divisor)
            .map(|amount| Money(amount).round_to_cents())
    }

    /// VAT portion of this amount at the given percentage, rounded to cents.
    ///
    /// `round(amount * vat / 100, 2)`
    pub fn vat_portion(&self, vat_percent: u32) -> Option<Money> {
        self.0
            .checked_mul(Decimal::from(vat_percent))?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(|amount| Money(amount).round_to_cents())
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Full-precision decimal text, used for storage.
    ///
    /// Unlike `Display`, this does not pad or round: a stored value
    /// reads back exactly as it was written.
    pub fn to_storage_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

/// Displays money with exactly two decimals ("10.50"), rounding half-up.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_to_cents().0;
        rounded.rescale(CENT_PLACES);
        write!(f, "{}", rounded)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
