//! # Service Factory
//!
//! Turns a validated [`PlatformConfig`] into a ready-to-initialize
//! [`KioskService`] bundle.
//!
//! ## Construction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PlatformConfig                                                          │
//! │       │                                                                  │
//! │       ├─ validate() ────────── Config error? ──► fail fast, no network   │
//! │       │                                                                  │
//! │       ├─ match connection ──► InMemory / Shopify / Woo / Magento adapter │
//! │       │                        (exhaustive - no default arm)             │
//! │       │                                                                  │
//! │       ├─ LedgerBasketService(tax rate, currency)   kiosk-local basket    │
//! │       │                                                                  │
//! │       └─► KioskService::assemble(adapter, basket)                        │
//! │                                                                          │
//! │  The factory is an explicit instance owned by the session - not a        │
//! │  global. Tests construct as many as they like.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use kiosk_core::types::{Platform, TaxRate};
use tracing::info;

use crate::adapters::{InMemoryAdapter, MagentoAdapter, ShopifyAdapter, WooCommerceAdapter};
use crate::basket::LedgerBasketService;
use crate::config::{PlatformConfig, PlatformConnection};
use crate::error::PlatformResult;
use crate::service::{BasketService, KioskService};

/// Builds platform service bundles from configuration.
#[derive(Debug, Default, Clone)]
pub struct ServiceFactory;

impl ServiceFactory {
    pub fn new() -> Self {
        ServiceFactory
    }

    /// The platforms this factory can construct, in display order.
    pub fn supported_platforms(&self) -> &'static [Platform] {
        &Platform::ALL
    }

    /// The out-of-the-box config: the demo store with the mock processor.
    pub fn default_config(&self) -> PlatformConfig {
        PlatformConfig::in_memory("Demo Store")
    }

    /// Constructs the full service bundle for one platform config.
    ///
    /// Fails fast on config problems without touching the network. The
    /// returned bundle has NOT been initialized; the caller decides when to
    /// pay for the connectivity check.
    pub fn create_service(&self, config: &PlatformConfig) -> PlatformResult<KioskService> {
        config.validate()?;

        let basket: Arc<dyn BasketService> = Arc::new(LedgerBasketService::new(
            TaxRate::from_fraction(config.kiosk.tax_rate),
            config.kiosk.currency.clone(),
        ));

        let service = match &config.connection {
            PlatformConnection::InMemory => {
                KioskService::assemble(Arc::new(InMemoryAdapter::new(config)), basket)
            }
            PlatformConnection::Shopify {
                base_url,
                storefront_token,
            } => KioskService::assemble(
                Arc::new(ShopifyAdapter::new(
                    base_url,
                    storefront_token,
                    config.payment_processor.clone(),
                )?),
                basket,
            ),
            PlatformConnection::WooCommerce {
                base_url,
                consumer_key,
                consumer_secret,
            } => KioskService::assemble(
                Arc::new(WooCommerceAdapter::new(
                    base_url,
                    consumer_key,
                    consumer_secret,
                    config.payment_processor.clone(),
                    &config.kiosk.currency,
                )?),
                basket,
            ),
            PlatformConnection::Magento {
                base_url,
                access_token,
            } => KioskService::assemble(
                Arc::new(MagentoAdapter::new(
                    base_url,
                    access_token,
                    config.payment_processor.clone(),
                    &config.kiosk.currency,
                )?),
                basket,
            ),
        };

        info!(platform = %service.platform, name = %config.name, "service bundle constructed");
        Ok(service)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KioskSettings;
    use crate::error::PlatformError;

    #[test]
    fn test_supported_platforms_is_the_full_set() {
        let factory = ServiceFactory::new();
        assert_eq!(factory.supported_platforms().len(), 4);
        assert_eq!(factory.supported_platforms()[0], Platform::InMemory);
    }

    #[test]
    fn test_default_config_builds() {
        let factory = ServiceFactory::new();
        let service = factory.create_service(&factory.default_config()).unwrap();
        assert_eq!(service.platform, Platform::InMemory);
    }

    #[test]
    fn test_invalid_config_fails_before_construction() {
        let factory = ServiceFactory::new();
        let config = PlatformConfig {
            name: "Broken".to_string(),
            connection: PlatformConnection::Magento {
                base_url: "https://m.example.com".to_string(),
                access_token: String::new(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };
        assert!(matches!(
            factory.create_service(&config),
            Err(PlatformError::Config { .. })
        ));
    }

    #[test]
    fn test_remote_configs_construct_offline() {
        // Construction never touches the network for any platform.
        let factory = ServiceFactory::new();
        let configs = [
            PlatformConfig {
                name: "Shop".to_string(),
                connection: PlatformConnection::Shopify {
                    base_url: "https://shop.myshopify.com".to_string(),
                    storefront_token: "tok".to_string(),
                },
                payment_processor: None,
                kiosk: KioskSettings::default(),
            },
            PlatformConfig {
                name: "Woo".to_string(),
                connection: PlatformConnection::WooCommerce {
                    base_url: "https://woo.example.com".to_string(),
                    consumer_key: "ck".to_string(),
                    consumer_secret: "cs".to_string(),
                },
                payment_processor: None,
                kiosk: KioskSettings::default(),
            },
            PlatformConfig {
                name: "Magento".to_string(),
                connection: PlatformConnection::Magento {
                    base_url: "https://magento.example.com".to_string(),
                    access_token: "tok".to_string(),
                },
                payment_processor: None,
                kiosk: KioskSettings::default(),
            },
        ];

        for config in configs {
            let service = factory.create_service(&config).unwrap();
            assert_eq!(service.platform, config.platform());
        }
    }
}
