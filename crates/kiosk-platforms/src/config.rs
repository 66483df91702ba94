//! # Platform Configuration
//!
//! Describes which adapter to instantiate and its credentials.
//!
//! ## Validation Happens Up Front
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Configuration Validation Flow                              │
//! │                                                                         │
//! │  PlatformConfig ──► validate() ──► ServiceFactory::create_service       │
//! │        │                │                                               │
//! │        │                ├── empty credential ──► Config error           │
//! │        │                ├── malformed base URL ─► Config error          │
//! │        │                └── ok ────────────────► adapter constructed    │
//! │        │                                                                │
//! │  Configuration errors are raised BEFORE any network call and are        │
//! │  non-retryable. Connectivity problems surface later, in initialize().   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The connection is a tagged union matched exhaustively in the factory:
//! an unknown platform tag is a deserialization error at the edge, never a
//! silent fallthrough inside the factory.

use kiosk_core::types::{PaymentMethodInfo, Platform};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PlatformError, PlatformResult};

// =============================================================================
// Platform Connection
// =============================================================================

/// How to reach one commerce backend, with its credentials.
///
/// Each variant carries exactly the fields its platform needs - there is no
/// bag of optional credential fields to get half-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlatformConnection {
    /// Built-in demo store. No credentials, no network.
    InMemory,

    /// Shopify Storefront GraphQL API.
    Shopify {
        /// Shop URL, e.g. `https://my-shop.myshopify.com`.
        base_url: String,
        /// Storefront access token (sent as
        /// `X-Shopify-Storefront-Access-Token`).
        storefront_token: String,
    },

    /// WooCommerce REST API.
    WooCommerce {
        /// Store URL, e.g. `https://shop.example.com`.
        base_url: String,
        /// REST consumer key (`ck_...`).
        consumer_key: String,
        /// REST consumer secret (`cs_...`), combined with the key into a
        /// Basic auth header.
        consumer_secret: String,
    },

    /// Magento REST API.
    Magento {
        /// Store URL, e.g. `https://magento.example.com`.
        base_url: String,
        /// Admin integration token (sent as `Authorization: Bearer`).
        access_token: String,
    },
}

impl PlatformConnection {
    /// The platform tag this connection targets.
    pub const fn platform(&self) -> Platform {
        match self {
            PlatformConnection::InMemory => Platform::InMemory,
            PlatformConnection::Shopify { .. } => Platform::Shopify,
            PlatformConnection::WooCommerce { .. } => Platform::WooCommerce,
            PlatformConnection::Magento { .. } => Platform::Magento,
        }
    }
}

/// Parses an external platform tag ("shopify", "magento", ...).
///
/// Kiosk device configs arrive as strings; anything outside the supported
/// set is an explicit error, not a silent fallthrough.
pub fn parse_platform_tag(tag: &str) -> PlatformResult<Platform> {
    Platform::ALL
        .into_iter()
        .find(|p| p.as_str() == tag)
        .ok_or_else(|| PlatformError::UnsupportedPlatform {
            tag: tag.to_string(),
        })
}

// =============================================================================
// Payment Processor
// =============================================================================

/// Optional payment processor wired into checkout.
///
/// Consumed by `checkout_data` to enumerate payment methods. When absent,
/// checkout falls back to a single cash method so the payment screen is
/// never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentProcessorConfig {
    /// Simulated processor for demos and tests.
    Mock,
    /// Stripe Terminal.
    Stripe { publishable_key: String },
    /// Square Terminal.
    Square {
        application_id: String,
        location_id: String,
    },
    /// Adyen in-person payments.
    Adyen {
        merchant_account: String,
        client_key: String,
    },
}

impl PaymentProcessorConfig {
    /// The payment methods this processor offers on the payment screen.
    pub fn payment_methods(&self) -> Vec<PaymentMethodInfo> {
        match self {
            PaymentProcessorConfig::Mock => vec![PaymentMethodInfo {
                id: "mock_card".to_string(),
                label: "Card (simulated)".to_string(),
                processor: "mock".to_string(),
            }],
            PaymentProcessorConfig::Stripe { .. } => vec![PaymentMethodInfo {
                id: "stripe_card".to_string(),
                label: "Card".to_string(),
                processor: "stripe".to_string(),
            }],
            PaymentProcessorConfig::Square { .. } => vec![PaymentMethodInfo {
                id: "square_card".to_string(),
                label: "Card".to_string(),
                processor: "square".to_string(),
            }],
            PaymentProcessorConfig::Adyen { .. } => vec![PaymentMethodInfo {
                id: "adyen_card".to_string(),
                label: "Card".to_string(),
                processor: "adyen".to_string(),
            }],
        }
    }
}

// =============================================================================
// Kiosk Settings
// =============================================================================

/// Per-kiosk commerce settings the basket ledger is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskSettings {
    /// ISO 4217 currency the kiosk sells in.
    pub currency: String,
    /// Tax rate as a fraction (0.2 = 20%).
    pub tax_rate: f64,
}

impl Default for KioskSettings {
    /// UK defaults: GBP at 20% VAT.
    fn default() -> Self {
        KioskSettings {
            currency: "GBP".to_string(),
            tax_rate: 0.2,
        }
    }
}

// =============================================================================
// Platform Config
// =============================================================================

/// Everything needed to construct one platform's service bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Display name shown in the platform picker.
    pub name: String,
    /// Connection + credentials (tagged by platform).
    pub connection: PlatformConnection,
    /// Optional payment processor for checkout.
    pub payment_processor: Option<PaymentProcessorConfig>,
    /// Kiosk-local commerce settings.
    #[serde(default)]
    pub kiosk: KioskSettings,
}

impl PlatformConfig {
    /// Creates an in-memory demo config with the mock processor.
    pub fn in_memory(name: impl Into<String>) -> Self {
        PlatformConfig {
            name: name.into(),
            connection: PlatformConnection::InMemory,
            payment_processor: Some(PaymentProcessorConfig::Mock),
            kiosk: KioskSettings::default(),
        }
    }

    /// The platform tag this config targets.
    pub const fn platform(&self) -> Platform {
        self.connection.platform()
    }

    /// Fails fast on missing credentials or a malformed base URL.
    ///
    /// Runs synchronously before any network call; a config that passes here
    /// can still fail `initialize()` if the backend is unreachable.
    pub fn validate(&self) -> PlatformResult<()> {
        let platform = self.platform();

        match &self.connection {
            PlatformConnection::InMemory => Ok(()),
            PlatformConnection::Shopify {
                base_url,
                storefront_token,
            } => {
                require(platform, "baseUrl", base_url)?;
                require(platform, "storefrontToken", storefront_token)?;
                require_url(platform, base_url)
            }
            PlatformConnection::WooCommerce {
                base_url,
                consumer_key,
                consumer_secret,
            } => {
                require(platform, "baseUrl", base_url)?;
                require(platform, "consumerKey", consumer_key)?;
                require(platform, "consumerSecret", consumer_secret)?;
                require_url(platform, base_url)
            }
            PlatformConnection::Magento {
                base_url,
                access_token,
            } => {
                require(platform, "baseUrl", base_url)?;
                require(platform, "accessToken", access_token)?;
                require_url(platform, base_url)
            }
        }
    }
}

/// A required credential/config field must be non-empty.
fn require(platform: Platform, field: &str, value: &str) -> PlatformResult<()> {
    if value.trim().is_empty() {
        return Err(PlatformError::Config {
            platform,
            reason: format!("{field} is required"),
        });
    }
    Ok(())
}

/// The base URL must parse as an absolute http(s) URL.
fn require_url(platform: Platform, base_url: &str) -> PlatformResult<()> {
    let url = Url::parse(base_url).map_err(|e| PlatformError::Config {
        platform,
        reason: format!("baseUrl is not a valid URL: {e}"),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PlatformError::Config {
            platform,
            reason: format!("baseUrl must be http(s), got {}", url.scheme()),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_validates() {
        assert!(PlatformConfig::in_memory("Demo").validate().is_ok());
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let config = PlatformConfig {
            name: "Shop".to_string(),
            connection: PlatformConnection::Shopify {
                base_url: "https://shop.myshopify.com".to_string(),
                storefront_token: "  ".to_string(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            PlatformError::Config {
                platform: Platform::Shopify,
                ..
            }
        ));
        assert!(err.to_string().contains("storefrontToken"));
    }

    #[test]
    fn test_malformed_base_url_fails_fast() {
        let config = PlatformConfig {
            name: "Woo".to_string(),
            connection: PlatformConnection::WooCommerce {
                base_url: "not a url".to_string(),
                consumer_key: "ck_x".to_string(),
                consumer_secret: "cs_y".to_string(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };
        assert!(matches!(
            config.validate(),
            Err(PlatformError::Config { .. })
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let config = PlatformConfig {
            name: "Magento".to_string(),
            connection: PlatformConnection::Magento {
                base_url: "ftp://magento.example.com".to_string(),
                access_token: "token".to_string(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };
        assert!(matches!(
            config.validate(),
            Err(PlatformError::Config { .. })
        ));
    }

    #[test]
    fn test_parse_platform_tag() {
        assert_eq!(parse_platform_tag("shopify").unwrap(), Platform::Shopify);
        assert!(matches!(
            parse_platform_tag("bigcommerce"),
            Err(PlatformError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_connection_tag_round_trips_through_serde() {
        let connection = PlatformConnection::Magento {
            base_url: "https://m.example.com".to_string(),
            access_token: "t".to_string(),
        };
        let json = serde_json::to_string(&connection).unwrap();
        assert!(json.contains("\"type\":\"magento\""));
        let back: PlatformConnection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, connection);
    }

    #[test]
    fn test_processor_methods_never_empty_for_known_processors() {
        for processor in [
            PaymentProcessorConfig::Mock,
            PaymentProcessorConfig::Stripe {
                publishable_key: "pk".to_string(),
            },
        ] {
            assert!(!processor.payment_methods().is_empty());
        }
    }
}
