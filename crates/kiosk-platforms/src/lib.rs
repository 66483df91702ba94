//! # Kiosk Platforms
//!
//! Platform adapters and service orchestration for the kiosk: every
//! supported commerce backend behind one capability-set contract.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         kiosk-platforms                                 │
//! │                                                                         │
//! │   UI shell                                                              │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  ┌─────────────┐   switch    ┌────────────────┐   create   ┌─────────┐ │
//! │  │ KioskSession│────────────►│ ServiceFactory │───────────►│ Kiosk   │ │
//! │  │  (session)  │             │   (factory)    │            │ Service │ │
//! │  └─────────────┘             └────────────────┘            └────┬────┘ │
//! │                                                                 │      │
//! │            ┌──────────────┬──────────────┬──────────────┬───────┘      │
//! │            ▼              ▼              ▼              ▼              │
//! │      ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐        │
//! │      │ InMemory │   │ Shopify  │   │   Woo    │   │ Magento  │        │
//! │      │ adapter  │   │ GraphQL  │   │ REST v3  │   │ REST V1  │        │
//! │      └──────────┘   └──────────┘   └──────────┘   └──────────┘        │
//! │                                                                         │
//! │   The basket never crosses this boundary until checkout: it is a        │
//! │   kiosk-local ledger (kiosk-core) served by LedgerBasketService.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Adapters translate platform wire types into the canonical model from
//! `kiosk-core` at their own boundary; callers only ever see canonical
//! types and [`error::PlatformError`].

pub mod adapters;
pub mod basket;
pub mod checkout;
pub mod config;
pub mod error;
pub mod factory;
pub mod http;
pub mod service;
pub mod session;

pub use basket::LedgerBasketService;
pub use config::{KioskSettings, PaymentProcessorConfig, PlatformConfig, PlatformConnection};
pub use error::{PlatformError, PlatformResult};
pub use factory::ServiceFactory;
pub use service::KioskService;
pub use session::KioskSession;
