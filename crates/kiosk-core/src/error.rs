//! # Error Types
//!
//! Domain-specific error types for kiosk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kiosk-core errors (this file)                                         │
//! │  └── CoreError      - Basket/domain rule violations                    │
//! │                                                                         │
//! │  kiosk-platforms errors (separate crate)                               │
//! │  └── PlatformError  - Config, network, decode, unsupported features    │
//! │                                                                         │
//! │  Flow: CoreError → PlatformError → kiosk UI                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, limits)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Basket and domain rule violations.
///
/// Benign conditions (removing an absent line, applying an unknown discount
/// code) are deliberately *not* errors - those are defined as no-ops by the
/// basket contract. Everything here is a hard failure the caller must handle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An explicit quantity update named a line that is not in the basket.
    ///
    /// Unlike `remove_line` (a no-op when absent), `update_quantity` on a
    /// missing line means the caller's view of the basket has drifted and
    /// silently doing nothing would hide that.
    #[error("Basket line not found: {product_id}")]
    LineNotFound { product_id: String },

    /// Basket has exceeded the maximum allowed number of lines.
    #[error("Basket cannot have more than {max} lines")]
    BasketTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A non-positive quantity was passed to an operation that does not
    /// define removal semantics (e.g. `add_line`).
    #[error("Quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineNotFound {
            product_id: "sku-42".to_string(),
        };
        assert_eq!(err.to_string(), "Basket line not found: sku-42");

        let err = CoreError::QuantityTooLarge {
            requested: 5000,
            max: 999,
        };
        assert_eq!(
            err.to_string(),
            "Quantity 5000 exceeds maximum allowed (999)"
        );
    }
}
