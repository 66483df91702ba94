//! # Basket Ledger
//!
//! The stateful line-item ledger and its recomputation algorithm.
//!
//! ## Recompute Is the Single Source of Truth
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Basket Mutation Protocol                             │
//! │                                                                         │
//! │  add_line ──────┐                                                       │
//! │  remove_line ───┤                                                       │
//! │  update_qty ────┼──► mutate lines/discount ──► recompute() ──► snapshot │
//! │  clear ─────────┤                                                       │
//! │  apply_discount ┘                                                       │
//! │                                                                         │
//! │  recompute derives, in order:                                           │
//! │    gross    = Σ line.unit_price × line.quantity                         │
//! │    discount = round(gross × discount_rate)          (0 if none)         │
//! │    subtotal = gross − discount                                          │
//! │    tax      = round(subtotal × tax_rate)                                │
//! │    total    = subtotal + tax                                            │
//! │                                                                         │
//! │  Totals are NEVER incrementally patched. Every mutator ends in a full   │
//! │  recompute, so the totals can never drift from the lines.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Canonical Unit Price
//! Each line stores its unit price, captured when the line is first added
//! (price freezing: a platform-side price change never reprices a basket
//! mid-order). The line total is *always* derived as `unit_price × quantity`
//! and never stored, so repeated quantity edits cannot accumulate rounding
//! drift the way deriving the unit price back out of a stored total would.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{TaxRate, VariantItem};
use crate::{DEMO_DISCOUNT_CODE, MAX_BASKET_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Basket Line
// =============================================================================

/// One product's aggregated quantity and price within a basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BasketLine {
    /// Unique key within a basket.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Quantity in the basket. Always positive.
    pub quantity: i64,

    /// Unit price in cents at time of adding (frozen).
    /// The line total is derived from this, never stored.
    pub unit_price_cents: i64,

    /// Selected options, in selection order.
    pub variants: Vec<VariantItem>,
}

impl BasketLine {
    /// Creates a new basket line with no variants.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        unit_price_cents: i64,
    ) -> Self {
        BasketLine {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price_cents,
            variants: Vec::new(),
        }
    }

    /// Attaches selected variants to the line.
    pub fn with_variants(mut self, variants: Vec<VariantItem>) -> Self {
        self.variants = variants;
        self
    }

    /// The line total in cents: `unit_price × quantity`, always derived.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// The line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount applied to the basket, as a first-class replayable adjustment.
///
/// The discount never mutates stored totals. Recompute re-applies it to the
/// current gross on every pass, so applying a code is idempotent and removing
/// it restores the exact undiscounted totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    /// The code the customer entered.
    pub code: String,
    /// Discount rate in basis points (1000 = 10%).
    pub rate_bps: u32,
}

// =============================================================================
// Basket Snapshot
// =============================================================================

/// A deep, defensively-copied view of the basket.
///
/// Returned by every ledger operation. Mutating a snapshot can never reach
/// back into the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    /// Lines keyed by product id (unique), in insertion order.
    pub lines: Vec<BasketLine>,
    /// Subtotal after discount, in cents.
    pub subtotal_cents: i64,
    /// Discount amount subtracted from the gross, in cents.
    pub discount_cents: i64,
    /// Tax on the subtotal, in cents.
    pub tax_cents: i64,
    /// Grand total: subtotal + tax, in cents.
    pub total_cents: i64,
    /// ISO 4217 currency all amounts are denominated in.
    pub currency: String,
    /// The discount currently applied, if any.
    pub discount: Option<AppliedDiscount>,
}

// =============================================================================
// Basket Ledger
// =============================================================================

/// The basket engine: holds lines and re-derives totals on every mutation.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Quantity is always positive (`update_quantity(.., 0)` removes the line)
/// - After every operation: `total == subtotal + tax` and
///   `subtotal + discount == Σ line totals`
/// - Recompute without an intervening mutation is a no-op
#[derive(Debug, Clone)]
pub struct BasketLedger {
    lines: Vec<BasketLine>,
    discount: Option<AppliedDiscount>,
    /// Codes this ledger resolves locally. Real platforms resolve codes
    /// server-side; the demo store seeds DISCOUNT10 here.
    known_codes: HashMap<String, u32>,
    tax_rate: TaxRate,
    currency: String,
    // Cached derivation, refreshed by recompute().
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
}

impl BasketLedger {
    /// Creates an empty ledger.
    ///
    /// Seeds the demo discount code; adapters can register more via
    /// [`BasketLedger::with_discount_code`].
    pub fn new(tax_rate: TaxRate, currency: impl Into<String>) -> Self {
        let mut known_codes = HashMap::new();
        known_codes.insert(DEMO_DISCOUNT_CODE.to_string(), 1000);

        let mut ledger = BasketLedger {
            lines: Vec::new(),
            discount: None,
            known_codes,
            tax_rate,
            currency: currency.into(),
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 0,
        };
        ledger.recompute();
        ledger
    }

    /// Registers an additional locally-resolvable discount code.
    pub fn with_discount_code(mut self, code: impl Into<String>, rate_bps: u32) -> Self {
        self.known_codes.insert(code.into(), rate_bps);
        self
    }

    /// Adds a line, merging with an existing line for the same product.
    ///
    /// ## Merge Behavior
    /// - Quantities add
    /// - The existing line's unit price stays frozen: the first-add price
    ///   wins unconditionally, and a differing price on the incoming line is
    ///   ignored. A platform-side price change mid-order must not reprice
    ///   what the customer already saw added.
    /// - Variant lists concatenate
    pub fn add_line(&mut self, line: BasketLine) -> CoreResult<Basket> {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                quantity: line.quantity,
            });
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            let new_qty = existing.quantity + line.quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            existing.variants.extend(line.variants);
        } else {
            if self.lines.len() >= MAX_BASKET_LINES {
                return Err(CoreError::BasketTooLarge {
                    max: MAX_BASKET_LINES,
                });
            }
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: line.quantity,
                    max: MAX_LINE_QUANTITY,
                });
            }
            self.lines.push(line);
        }

        self.recompute();
        Ok(self.snapshot())
    }

    /// Removes a line by product id.
    ///
    /// A no-op (not an error) when the line is absent: the customer's intent
    /// - that product not being in the basket - already holds.
    pub fn remove_line(&mut self, product_id: &str) -> Basket {
        self.lines.retain(|l| l.product_id != product_id);
        self.recompute();
        self.snapshot()
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: equivalent to [`BasketLedger::remove_line`]
    /// - missing line: [`CoreError::LineNotFound`] - an explicit update on a
    ///   line that isn't there means the caller's view has drifted
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<Basket> {
        if quantity <= 0 {
            return Ok(self.remove_line(product_id));
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound {
                product_id: product_id.to_string(),
            })?;

        line.quantity = quantity;
        self.recompute();
        Ok(self.snapshot())
    }

    /// Clears all lines and any applied discount.
    pub fn clear(&mut self) -> Basket {
        self.lines.clear();
        self.discount = None;
        self.recompute();
        self.snapshot()
    }

    /// Applies a discount code.
    ///
    /// An unknown code is a benign no-op: the basket is returned unchanged
    /// and the kiosk shows "code not recognised" without erroring the order.
    /// Applying a known code twice does not compound - the discount is a
    /// replayable adjustment, not a subtotal mutation.
    pub fn apply_discount(&mut self, code: &str) -> Basket {
        if let Some(&rate_bps) = self.known_codes.get(code) {
            self.discount = Some(AppliedDiscount {
                code: code.to_string(),
                rate_bps,
            });
            self.recompute();
        }
        self.snapshot()
    }

    /// Removes any applied discount.
    pub fn remove_discount(&mut self) -> Basket {
        self.discount = None;
        self.recompute();
        self.snapshot()
    }

    /// Returns a deep, defensively-copied view of the basket.
    pub fn snapshot(&self) -> Basket {
        Basket {
            lines: self.lines.clone(),
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            currency: self.currency.clone(),
            discount: self.discount.clone(),
        }
    }

    /// Checks if the basket has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The currency this ledger is denominated in.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Re-derives all totals from the current lines and discount.
    ///
    /// Idempotent by construction: it reads only `lines` and `discount` and
    /// overwrites every cached total.
    fn recompute(&mut self) {
        let gross: i64 = self.lines.iter().map(BasketLine::line_total_cents).sum();

        let discounted = match &self.discount {
            Some(d) => Money::from_cents(gross).apply_percentage_discount(d.rate_bps),
            None => Money::from_cents(gross),
        };

        self.discount_cents = gross - discounted.cents();
        self.subtotal_cents = discounted.cents();
        self.tax_cents = discounted.calculate_tax(self.tax_rate).cents();
        self.total_cents = self.subtotal_cents + self.tax_cents;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 20% VAT, the demo store's rate.
    fn ledger() -> BasketLedger {
        BasketLedger::new(TaxRate::from_fraction(0.2), "GBP")
    }

    fn assert_invariants(basket: &Basket) {
        let gross: i64 = basket.lines.iter().map(BasketLine::line_total_cents).sum();
        assert_eq!(basket.subtotal_cents + basket.discount_cents, gross);
        assert_eq!(basket.total_cents, basket.subtotal_cents + basket.tax_cents);
    }

    #[test]
    fn test_add_line() {
        let mut ledger = ledger();
        let basket = ledger
            .add_line(BasketLine::new("p1", "Latte", 2, 350))
            .unwrap();

        assert_eq!(basket.lines.len(), 1);
        assert_eq!(basket.subtotal_cents, 700);
        assert_eq!(basket.tax_cents, 140);
        assert_eq!(basket.total_cents, 840);
        assert_invariants(&basket);
    }

    #[test]
    fn test_merge_on_add() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();
        let basket = ledger.add_line(BasketLine::new("p1", "Latte", 3, 350)).unwrap();

        assert_eq!(basket.lines.len(), 1);
        assert_eq!(basket.lines[0].quantity, 5);
        // Merged line total equals the sum of both additions' cent totals.
        assert_eq!(basket.lines[0].line_total_cents(), 700 + 1050);
        assert_invariants(&basket);
    }

    #[test]
    fn test_merge_keeps_frozen_price_on_mismatch() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();

        // Incoming line carries a different price (platform repriced
        // mid-order); the frozen first-add price still wins.
        let basket = ledger.add_line(BasketLine::new("p1", "Latte", 1, 999)).unwrap();
        assert_eq!(basket.lines[0].unit_price_cents, 350);
        assert_eq!(basket.lines[0].quantity, 3);
        assert_eq!(basket.subtotal_cents, 1050);
        assert_invariants(&basket);
    }

    #[test]
    fn test_merge_concatenates_variants() {
        let mut ledger = ledger();
        let first = BasketLine::new("p1", "Latte", 1, 350).with_variants(vec![VariantItem {
            name: "Size".to_string(),
            value: "Large".to_string(),
            price_delta_cents: 50,
        }]);
        let second = BasketLine::new("p1", "Latte", 1, 350).with_variants(vec![VariantItem {
            name: "Milk".to_string(),
            value: "Oat".to_string(),
            price_delta_cents: 0,
        }]);

        ledger.add_line(first).unwrap();
        let basket = ledger.add_line(second).unwrap();
        assert_eq!(basket.lines[0].variants.len(), 2);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut ledger = ledger();
        let err = ledger
            .add_line(BasketLine::new("p1", "Latte", 0, 350))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { quantity: 0 }));
    }

    #[test]
    fn test_remove_line_absent_is_noop() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 1, 350)).unwrap();

        let basket = ledger.remove_line("nope");
        assert_eq!(basket.lines.len(), 1);
        assert_invariants(&basket);
    }

    #[test]
    fn test_update_quantity() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();

        let basket = ledger.update_quantity("p1", 4).unwrap();
        assert_eq!(basket.lines[0].quantity, 4);
        assert_eq!(basket.subtotal_cents, 1400);
        assert_invariants(&basket);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();

        let basket = ledger.update_quantity("p1", 0).unwrap();
        assert!(basket.lines.is_empty());
        assert_eq!(basket.total_cents, 0);
    }

    #[test]
    fn test_update_quantity_missing_line_is_hard_error() {
        let mut ledger = ledger();
        let err = ledger.update_quantity("ghost", 3).unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound { .. }));
    }

    /// The canonical-unit-price design: repeated quantity edits never drift.
    #[test]
    fn test_no_rounding_drift_across_quantity_edits() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Thing", 3, 333)).unwrap();

        for qty in [7, 1, 13, 2, 999, 5] {
            let basket = ledger.update_quantity("p1", qty).unwrap();
            assert_eq!(basket.lines[0].unit_price_cents, 333);
            assert_eq!(basket.subtotal_cents, 333 * qty);
            assert_invariants(&basket);
        }
    }

    #[test]
    fn test_clear_yields_empty_zero_basket() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();
        ledger.apply_discount(DEMO_DISCOUNT_CODE);

        let basket = ledger.clear();
        assert!(basket.lines.is_empty());
        assert_eq!(basket.subtotal_cents, 0);
        assert_eq!(basket.tax_cents, 0);
        assert_eq!(basket.total_cents, 0);
        assert!(basket.discount.is_none());
    }

    #[test]
    fn test_idempotent_recompute() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 3, 333)).unwrap();
        ledger.apply_discount(DEMO_DISCOUNT_CODE);

        let before = ledger.snapshot();
        ledger.recompute();
        ledger.recompute();
        assert_eq!(ledger.snapshot(), before);
    }

    /// DISCOUNT10 on a 100.00 basket at 20% VAT.
    #[test]
    fn test_discount_scenario() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Bundle", 1, 10000)).unwrap();

        let basket = ledger.apply_discount("DISCOUNT10");
        assert_eq!(basket.subtotal_cents, 9000);
        assert_eq!(basket.discount_cents, 1000);
        assert_eq!(basket.tax_cents, 1800);
        assert_eq!(basket.total_cents, 10800);
    }

    #[test]
    fn test_discount_does_not_compound() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Bundle", 1, 10000)).unwrap();

        ledger.apply_discount("DISCOUNT10");
        let basket = ledger.apply_discount("DISCOUNT10");
        assert_eq!(basket.subtotal_cents, 9000);
    }

    #[test]
    fn test_unknown_discount_code_is_benign_noop() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Bundle", 1, 10000)).unwrap();

        let basket = ledger.apply_discount("BOGUS");
        assert_eq!(basket.subtotal_cents, 10000);
        assert!(basket.discount.is_none());
    }

    #[test]
    fn test_remove_discount_restores_totals() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Bundle", 1, 10000)).unwrap();
        let undiscounted = ledger.snapshot();

        ledger.apply_discount("DISCOUNT10");
        let basket = ledger.remove_discount();
        assert_eq!(basket, undiscounted);
    }

    /// The ledger invariants hold after every operation in a mixed sequence.
    #[test]
    fn test_invariants_across_mutation_sequence() {
        let mut ledger = ledger();

        assert_invariants(&ledger.add_line(BasketLine::new("a", "A", 2, 199)).unwrap());
        assert_invariants(&ledger.add_line(BasketLine::new("b", "B", 1, 2250)).unwrap());
        assert_invariants(&ledger.update_quantity("a", 7).unwrap());
        assert_invariants(&ledger.remove_line("b"));
        assert_invariants(&ledger.add_line(BasketLine::new("c", "C", 3, 101)).unwrap());
        assert_invariants(&ledger.update_quantity("c", 0).unwrap());
        assert_invariants(&ledger.remove_line("never-there"));
    }

    #[test]
    fn test_snapshot_is_defensive_copy() {
        let mut ledger = ledger();
        ledger.add_line(BasketLine::new("p1", "Latte", 2, 350)).unwrap();

        let mut snapshot = ledger.snapshot();
        snapshot.lines[0].quantity = 999;
        snapshot.subtotal_cents = -1;

        // Engine state is untouched.
        let fresh = ledger.snapshot();
        assert_eq!(fresh.lines[0].quantity, 2);
        assert_eq!(fresh.subtotal_cents, 700);
    }

    #[test]
    fn test_line_limit() {
        let mut ledger = ledger();
        for i in 0..MAX_BASKET_LINES {
            ledger
                .add_line(BasketLine::new(format!("p{i}"), "X", 1, 100))
                .unwrap();
        }
        let err = ledger
            .add_line(BasketLine::new("overflow", "X", 1, 100))
            .unwrap_err();
        assert!(matches!(err, CoreError::BasketTooLarge { .. }));
    }
}
