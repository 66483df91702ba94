//! # Kiosk Session
//!
//! Owns the active platform service and performs two-phase switches.
//!
//! ## Switch Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              switch_platform(new config)                                │
//! │                                                                         │
//! │  1. take current service (session now has NO active platform)           │
//! │  2. dispose it          ── failure is logged and swallowed: a dispose   │
//! │                            error must never block leaving a platform    │
//! │  3. create new service  ── config error? ► propagate, stay inactive     │
//! │  4. initialize it       ── network error? ► propagate, stay inactive    │
//! │  5. install as active                                                   │
//! │                                                                         │
//! │  A failed switch NEVER leaves the old service half-disposed as the      │
//! │  active one. The session is either on the new platform or on none.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::factory::ServiceFactory;
use crate::service::KioskService;

/// The active platform and the config it was built from.
#[derive(Debug)]
struct ActivePlatform {
    config: PlatformConfig,
    service: KioskService,
}

/// Owns at most one live [`KioskService`] at a time.
#[derive(Debug, Default)]
pub struct KioskSession {
    factory: ServiceFactory,
    active: Option<ActivePlatform>,
}

impl KioskSession {
    pub fn new(factory: ServiceFactory) -> Self {
        KioskSession {
            factory,
            active: None,
        }
    }

    /// The factory this session constructs services with.
    pub fn factory(&self) -> &ServiceFactory {
        &self.factory
    }

    /// The active service, or [`PlatformError::NoActiveService`].
    pub fn active(&self) -> PlatformResult<&KioskService> {
        self.active
            .as_ref()
            .map(|a| &a.service)
            .ok_or(PlatformError::NoActiveService)
    }

    /// The config the active service was built from, if any.
    pub fn active_config(&self) -> Option<&PlatformConfig> {
        self.active.as_ref().map(|a| &a.config)
    }

    /// Switches to a new platform: dispose old, create + initialize new.
    ///
    /// On any failure the session is left with no active service and the
    /// error propagates to the caller.
    pub async fn switch_platform(&mut self, config: PlatformConfig) -> PlatformResult<&KioskService> {
        if let Some(old) = self.active.take() {
            info!(platform = %old.service.platform, "disposing previous platform");
            if let Err(e) = old.service.dispose().await {
                // Old platform resources are best-effort; the switch goes on.
                warn!(platform = %old.service.platform, error = %e, "dispose failed");
            }
        }

        let service = self.factory.create_service(&config)?;
        service.initialize().await?;

        info!(platform = %service.platform, name = %config.name, "platform switched");
        let active = self.active.insert(ActivePlatform { config, service });
        Ok(&active.service)
    }

    /// Disposes the active service, leaving the session inactive.
    pub async fn shutdown(&mut self) -> PlatformResult<()> {
        if let Some(old) = self.active.take() {
            old.service.dispose().await?;
            info!(platform = %old.service.platform, "session shut down");
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KioskSettings, PlatformConnection};
    use kiosk_core::types::Platform;

    fn session() -> KioskSession {
        KioskSession::new(ServiceFactory::new())
    }

    #[tokio::test]
    async fn test_no_active_service_initially() {
        let session = session();
        assert!(matches!(
            session.active(),
            Err(PlatformError::NoActiveService)
        ));
    }

    #[tokio::test]
    async fn test_switch_to_in_memory() {
        let mut session = session();
        let config = session.factory().default_config();
        session.switch_platform(config).await.unwrap();

        let service = session.active().unwrap();
        assert_eq!(service.platform, Platform::InMemory);
        assert_eq!(
            session.active_config().map(|c| c.platform()),
            Some(Platform::InMemory)
        );
    }

    #[tokio::test]
    async fn test_failed_switch_leaves_no_active_service() {
        let mut session = session();
        let config = session.factory().default_config();
        session.switch_platform(config).await.unwrap();

        // Unreachable backend: create succeeds, initialize fails.
        let bad = PlatformConfig {
            name: "Dead Woo".to_string(),
            connection: PlatformConnection::WooCommerce {
                base_url: "http://127.0.0.1:1".to_string(),
                consumer_key: "ck".to_string(),
                consumer_secret: "cs".to_string(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };

        assert!(session.switch_platform(bad).await.is_err());
        assert!(matches!(
            session.active(),
            Err(PlatformError::NoActiveService)
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_network_call() {
        let mut session = session();
        let bad = PlatformConfig {
            name: "Broken".to_string(),
            connection: PlatformConnection::Shopify {
                base_url: "not a url".to_string(),
                storefront_token: "tok".to_string(),
            },
            payment_processor: None,
            kiosk: KioskSettings::default(),
        };
        assert!(matches!(
            session.switch_platform(bad).await,
            Err(PlatformError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut session = session();
        let config = session.factory().default_config();
        session.switch_platform(config).await.unwrap();

        session.shutdown().await.unwrap();
        assert!(session.active().is_err());
        session.shutdown().await.unwrap();
    }
}
