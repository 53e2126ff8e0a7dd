//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER TOTALS WITH FLOATS                                               │
//! │                                                                         │
//! │    30.10 + 15.40 + 4.50 = 50.00000000000001   ❌                         │
//! │    "paid more than total" fires on a 1e-14 difference                   │
//! │                                                                         │
//! │  ORDER TOTALS WITH CENTS                                                │
//! │    3010 + 1540 + 450 = 5000                    ✅                        │
//! │    Comparisons between paid and payable are exact                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::money::Money;
//!
//! let pizza = Money::from_cents(3000);
//! let soda = Money::from_major_minor(15, 50);
//! let total = pizza + soda;
//! assert_eq!(total.cents(), 4550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► Item.price (× quantity, frozen) ──► GroupItem.total
///                                                            │
///                     Delivery tax ──────────────────────────┤
///                                                            ▼
///            PaymentOrder.amount ──► Order.total_paid   Order.total_payable
///                                          │                 │
///                                          └──► Order.total_change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    ///
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(45, 50).cents(), 4550);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `self - other`, floored at zero.
    ///
    /// Used for change and remaining-balance calculations, which are never
    /// negative.
    ///
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let paid = Money::from_cents(5000);
    /// let payable = Money::from_cents(4550);
    /// assert_eq!(paid.saturating_excess(payable).cents(), 450);
    /// assert_eq!(payable.saturating_excess(paid), Money::zero());
    /// ```
    #[inline]
    pub const fn saturating_excess(&self, other: Money) -> Money {
        if self.0 > other.0 {
            Money(self.0 - other.0)
        } else {
            Money(0)
        }
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Quantity options can be fractional (half a pizza is `0.5`), so the
    /// result is rounded half away from zero to the nearest cent.
    ///
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let pizza = Money::from_cents(4990);
    /// assert_eq!(pizza.multiply_quantity(2.0).cents(), 9980);
    /// assert_eq!(pizza.multiply_quantity(0.5).cents(), 2495);
    /// assert_eq!(Money::from_cents(999).multiply_quantity(0.5).cents(), 500);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: f64) -> Self {
        Money((self.0 as f64 * qty).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. Locale formatting belongs to the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
