//! # Checkout Orchestration Helpers
//!
//! Shared payment-method assembly used by every adapter's `checkout_data`.
//!
//! ## The One Hard Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  getCheckoutData must NEVER return zero payment methods.                │
//! │                                                                         │
//! │  platform methods ─┐                                                    │
//! │                    ├─► merge (dedupe by id, keep order) ─┐              │
//! │  processor methods ┘                                     ├─► non-empty? │
//! │                                                          │      │ no    │
//! │                                                          │      ▼       │
//! │                                                          │   [ cash ]   │
//! │                                                          ▼              │
//! │                                              payment screen renders     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A kiosk with an order on screen and no way to pay is a stuck customer.

use kiosk_core::basket::Basket;
use kiosk_core::types::{PaymentMethodInfo, Platform};

use crate::config::PaymentProcessorConfig;
use crate::error::{PlatformError, PlatformResult};

// =============================================================================
// Payment Method Assembly
// =============================================================================

/// The fallback offered when nothing else is configured: cash at the counter.
pub fn fallback_payment_methods() -> Vec<PaymentMethodInfo> {
    vec![PaymentMethodInfo::cash()]
}

/// Methods contributed by the configured processor, if any.
pub fn processor_payment_methods(
    processor: Option<&PaymentProcessorConfig>,
) -> Vec<PaymentMethodInfo> {
    processor.map(|p| p.payment_methods()).unwrap_or_default()
}

/// Merges platform-reported methods with processor methods.
///
/// Order is preserved (platform first), duplicates by id are dropped, and an
/// empty result is replaced by the cash fallback.
pub fn merge_payment_methods(
    platform_methods: Vec<PaymentMethodInfo>,
    processor_methods: Vec<PaymentMethodInfo>,
) -> Vec<PaymentMethodInfo> {
    let mut merged: Vec<PaymentMethodInfo> = Vec::new();
    for method in platform_methods.into_iter().chain(processor_methods) {
        if !merged.iter().any(|m| m.id == method.id) {
            merged.push(method);
        }
    }

    if merged.is_empty() {
        return fallback_payment_methods();
    }
    merged
}

// =============================================================================
// Basket → Order Mapping Helpers
// =============================================================================

/// Rejects empty baskets before any platform call is made.
///
/// Creating a draft order with no lines either fails platform-side half way
/// through or, worse, succeeds as a zero-total order. Neither is acceptable
/// on the checkout path.
pub fn require_non_empty(platform: Platform, basket: &Basket) -> PlatformResult<()> {
    if basket.lines.is_empty() {
        return Err(PlatformError::Checkout {
            platform,
            reason: "basket is empty".to_string(),
        });
    }
    Ok(())
}

/// Parses a canonical product id into the numeric id REST platforms expect.
pub fn numeric_product_id(platform: Platform, product_id: &str) -> PlatformResult<i64> {
    product_id.parse().map_err(|_| PlatformError::Checkout {
        platform,
        reason: format!("product id {product_id} is not numeric"),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
