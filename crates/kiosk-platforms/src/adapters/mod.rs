//! # Platform Adapters
//!
//! One submodule per commerce backend. Every adapter implements the full
//! capability set from [`crate::service`] plus
//! [`crate::service::PlatformLifecycle`], and translates its platform's wire
//! types into the canonical model at this boundary - nothing platform-shaped
//! leaks past `adapters/`.

pub mod inmemory;
pub mod magento;
pub mod shopify;
pub mod woocommerce;

pub use inmemory::InMemoryAdapter;
pub use magento::MagentoAdapter;
pub use shopify::ShopifyAdapter;
pub use woocommerce::WooCommerceAdapter;
