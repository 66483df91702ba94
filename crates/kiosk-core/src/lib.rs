//! # kiosk-core: Pure Business Logic for Kiosk Commerce
//!
//! This crate is the **heart** of the kiosk. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Kiosk Commerce Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Kiosk UI Shell (Electron/TS)                    │   │
//! │  │    Catalog UI ──► Basket UI ──► Payment UI ──► Confirmation     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              kiosk-platforms (Adapter Layer)                    │   │
//! │  │    InMemory │ Shopify │ WooCommerce │ Magento                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kiosk-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  basket   │  │ currency  │  │   │
//! │  │   │  Product  │  │   Money   │  │  Ledger   │  │  symbols  │  │   │
//! │  │   │ Checkout  │  │  TaxCalc  │  │ recompute │  │  formats  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Canonical domain types (Product, Category, CheckoutData, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`currency`] - Static currency table and display formatting
//! - [`basket`] - The basket ledger and its recompute algorithm
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kiosk_core::money::Money;
//! use kiosk_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(1099); // £10.99
//!
//! // Calculate tax in integer space
//! let vat = TaxRate::from_fraction(0.2); // 20% UK VAT
//! let tax = price.calculate_tax(vat);
//! assert_eq!(tax.cents(), 220);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod currency;
pub mod error;
pub mod money;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kiosk_core::Money` instead of
// `use kiosk_core::money::Money`

pub use basket::{AppliedDiscount, Basket, BasketLedger, BasketLine};
pub use error::{CoreError, CoreResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single basket
///
/// ## Business Reason
/// Prevents runaway baskets on an unattended kiosk and keeps draft-order
/// creation against the platform APIs within request-size limits.
pub const MAX_BASKET_LINES: usize = 100;

/// Maximum quantity of a single line in a basket
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., a stuck touch screen repeating
/// the add action).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// The discount code recognised by the demo store.
///
/// Real platforms resolve codes server-side; the in-memory platform and the
/// default ledger seed only this one.
pub const DEMO_DISCOUNT_CODE: &str = "DISCOUNT10";
