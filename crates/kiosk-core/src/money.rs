//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! major-unit conversion helpers used at the display/input boundary.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  At a self-service till:                                                │
//! │    a wrong cent in a basket total is silently wrong money charged       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Every computation happens on i64 cents; floats exist only at the    │
//! │    edges (price strings parsed in, display amounts rendered out)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kiosk_core::money::{self, Money};
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // £10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                      // £21.98
//! let total = price + Money::from_cents(500);   // £15.99
//!
//! // Major-unit helpers are exact for 2-decimal inputs
//! assert_eq!(money::add_money(0.1, 0.2), 0.3);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (pence for GBP).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, discounts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Copy**: Every read hands out an independent value, so a caller can
///   never alias engine-internal money through a returned basket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// Adapters, the basket ledger, and checkout all use cents.
    /// Only display code converts to major units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math: `(amount_cents * bps + 5000) / 10000`.
    /// The +5000 provides round-half-up (5000/10000 = 0.5). i128 keeps the
    /// intermediate product from overflowing on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use kiosk_core::money::Money;
    /// use kiosk_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(100);
    /// let tax = subtotal.calculate_tax(TaxRate::from_fraction(0.2));
    /// assert_eq!(tax.cents(), 20);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity (line total = unit price × qty).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use kiosk_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // £100.00
    /// let discounted = subtotal.apply_percentage_discount(1000); // 10% off
    /// assert_eq!(discounted.cents(), 9000); // £90.00
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        let discount_amount = (self.0 as i128 * discount_bps as i128 + 5000) / 10000;
        Money::from_cents(self.0 - discount_amount as i64)
    }
}

// =============================================================================
// Major-Unit Conversion (the float boundary)
// =============================================================================

/// Converts a major-unit amount (e.g. pounds) to integer cents.
///
/// Rounds half away from zero: `to_cents(1.005) == 101`.
///
/// Platform APIs hand us decimal price strings ("19.99") which get parsed to
/// f64 and must land on an exact cent. A naive `(major * 100.0).round()`
/// misrounds inputs like 1.005, whose closest f64 sits just *below* the true
/// decimal value, so we round once at a guard digit first.
pub fn to_cents(major: f64) -> i64 {
    let tenths_of_cent = (major * 1000.0).round();
    (tenths_of_cent / 10.0).round() as i64
}

/// Converts integer cents back to a major-unit float.
///
/// Display only. The result may carry binary-float representation error and
/// must never feed back into financial computation.
pub fn to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Adds two major-unit amounts exactly, via integer cents.
///
/// `add_money(0.1, 0.2) == 0.3`, not `0.30000000000000004`.
pub fn add_money(a: f64, b: f64) -> f64 {
    to_dollars(to_cents(a) + to_cents(b))
}

/// Subtracts two major-unit amounts exactly, via integer cents.
pub fn subtract_money(a: f64, b: f64) -> f64 {
    to_dollars(to_cents(a) - to_cents(b))
}

/// Multiplies a major-unit price by a quantity exactly, via integer cents.
pub fn multiply_money(unit_price: f64, quantity: i64) -> f64 {
    to_dollars(to_cents(unit_price) * quantity)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a plain debug format.
///
/// ## Note
/// This is for logs. Use [`crate::currency::format_money`] for anything the
/// customer sees, so symbol placement and decimals follow the currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_to_cents_basic() {
        assert_eq!(to_cents(10.99), 1099);
        assert_eq!(to_cents(0.1), 10);
        assert_eq!(to_cents(0.0), 0);
        assert_eq!(to_cents(100.0), 10000);
    }

    #[test]
    fn test_to_cents_half_cent_boundary() {
        // The closest f64 to 1.005 is 1.00499999..., which a naive
        // round-after-multiply turns into 100. We must get 101.
        assert_eq!(to_cents(1.005), 101);
        assert_eq!(to_cents(1.994), 199);
        assert_eq!(to_cents(2.675), 268);
        assert_eq!(to_cents(-1.005), -101);
    }

    #[test]
    fn test_round_trip_two_decimal_amounts() {
        // For every amount representable to 2 decimal places,
        // to_dollars(to_cents(d)) == d exactly.
        for cents in -100_000..100_000i64 {
            let d = cents as f64 / 100.0;
            assert_eq!(to_dollars(to_cents(d)), d, "round trip failed at {}", d);
        }
    }

    #[test]
    fn test_exact_decimal_addition() {
        assert_eq!(add_money(0.1, 0.2), 0.3);
        assert_ne!(0.1 + 0.2, 0.3); // the artifact we are avoiding
        assert_eq!(subtract_money(0.3, 0.1), 0.2);
        assert_eq!(multiply_money(0.1, 3), 0.3);
    }

    #[test]
    fn test_tax_determinism() {
        let amount = Money::from_cents(100);
        let rate = TaxRate::from_fraction(0.2);
        assert_eq!(amount.calculate_tax(rate).cents(), 20);

        // Non-negative input always yields a non-negative integer of cents.
        for cents in 0..10_000i64 {
            let tax = Money::from_cents(cents).calculate_tax(rate);
            assert!(tax.cents() >= 0);
        }
    }

    #[test]
    fn test_tax_rounding() {
        // 8.25% of £10.00 is £0.825, rounds half-up to £0.83
        let amount = Money::from_cents(1000);
        let tax = amount.calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000);
        let discounted = subtotal.apply_percentage_discount(1000);
        assert_eq!(discounted.cents(), 9000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line_total = unit_price.multiply_quantity(3);
        assert_eq!(line_total.cents(), 897);
    }

    /// Documents the intentional precision loss when splitting amounts.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten = Money::from_cents(1000);
        let one_third = Money::from_cents(1000 / 3); // 333 cents
        let reconstructed: Money = one_third * 3; // 999 cents

        assert_eq!(reconstructed.cents(), 999);
        assert_eq!((ten - reconstructed).cents(), 1);
    }
}
