//! # Platform Error Types
//!
//! Every error that can cross the adapter boundary.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Error Taxonomy                                    │
//! │                                                                         │
//! │  Configuration   Config / UnsupportedPlatform                           │
//! │                  Fail fast at construction, before any network call.    │
//! │                                                                         │
//! │  Network         Http / Network / Decode / GraphQl                      │
//! │                  Wrapped with the platform tag; raw reqwest/GraphQL     │
//! │                  payloads never leak across the abstraction.            │
//! │                                                                         │
//! │  Domain          Auth / NotFound / Checkout / Core                      │
//! │                  The checkout/payment path propagates these - it never  │
//! │                  silently degrades into inconsistent financial state.   │
//! │                                                                         │
//! │  Unimplemented   Explicit, clearly named - never a silent success.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kiosk_core::error::CoreError;
use kiosk_core::types::Platform;
use thiserror::Error;

// =============================================================================
// Platform Error
// =============================================================================

/// Errors surfaced by the adapter layer.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Missing/invalid credentials or base URL. Raised at construction time,
    /// non-retryable, before any network call.
    #[error("{platform} configuration error: {reason}")]
    Config { platform: Platform, reason: String },

    /// A platform tag that no adapter family handles.
    #[error("Unsupported platform: {tag}")]
    UnsupportedPlatform { tag: String },

    /// Non-2xx HTTP response from the platform.
    #[error("{platform} returned HTTP {status}: {reason}")]
    Http {
        platform: Platform,
        status: u16,
        reason: String,
    },

    /// Transport-level failure (DNS, connect, timeout).
    #[error("{platform} request failed")]
    Network {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// The platform responded 2xx but the body did not match the expected
    /// wire format.
    #[error("{platform} response could not be decoded: {reason}")]
    Decode { platform: Platform, reason: String },

    /// A GraphQL error payload (Shopify).
    #[error("{platform} GraphQL error: {message}")]
    GraphQl { platform: Platform, message: String },

    /// Login rejected or session invalid.
    #[error("{platform} authentication failed: {reason}")]
    Auth { platform: Platform, reason: String },

    /// A named resource the platform does not know.
    #[error("{platform} {resource} not found: {id}")]
    NotFound {
        platform: Platform,
        resource: &'static str,
        id: String,
    },

    /// A capability this adapter deliberately does not provide.
    /// Explicit and named - callers must never see a silent success instead.
    #[error("{platform} does not implement {feature}")]
    Unimplemented {
        platform: Platform,
        feature: &'static str,
    },

    /// A failure on the checkout/payment path. When raised during draft
    /// creation, any id obtained so far must be treated as invalid.
    #[error("{platform} checkout failed: {reason}")]
    Checkout { platform: Platform, reason: String },

    /// No platform is currently active in the session.
    #[error("No active platform service")]
    NoActiveService,

    /// A basket/domain rule violation from kiosk-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PlatformError.
pub type PlatformResult<T> = Result<T, PlatformError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_platform_context() {
        let err = PlatformError::Http {
            platform: Platform::WooCommerce,
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "woocommerce returned HTTP 503: Service Unavailable"
        );

        let err = PlatformError::Unimplemented {
            platform: Platform::Shopify,
            feature: "upgrade offers",
        };
        assert_eq!(err.to_string(), "shopify does not implement upgrade offers");
    }

    #[test]
    fn test_core_error_converts() {
        let core = CoreError::LineNotFound {
            product_id: "p1".to_string(),
        };
        let err: PlatformError = core.into();
        assert!(matches!(err, PlatformError::Core(_)));
    }
}
