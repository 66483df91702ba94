//! # Service Capability Traits
//!
//! The capability-set polymorphism contract: every adapter family implements
//! all of these, so any concrete adapter is substitutable wherever a
//! [`KioskService`] is expected.
//!
//! ## Capability Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KioskService                                    │
//! │                                                                         │
//! │  auth ──────► AuthService        login / logout                         │
//! │  catalog ───► CatalogService     categories                             │
//! │  products ──► ProductService     products / product                     │
//! │  basket ────► BasketService      add / remove / update / discount       │
//! │  cross_sell ► CrossSellService   suggestions / apply_upgrade            │
//! │  cms ───────► CmsService         splash                                 │
//! │  checkout ──► CheckoutService    create / data / pay / confirm          │
//! │                                                                         │
//! │  + PlatformLifecycle             initialize / dispose                   │
//! │                                                                         │
//! │  One KioskService per active platform, owned by the session. Disposed   │
//! │  before the next one is created.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use kiosk_core::basket::{Basket, BasketLine};
use kiosk_core::types::{
    AuthToken, Category, CheckoutData, CmsContent, ExtendedProduct, OrderConfirmation,
    PaymentOutcome, Platform, User,
};

use crate::error::PlatformResult;

// =============================================================================
// Capability Traits
// =============================================================================

/// Operator/customer authentication against the platform.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges credentials for the canonical token/user pair.
    async fn login(&self, username: &str, password: &str) -> PlatformResult<(AuthToken, User)>;

    /// Ends the session. Safe to call when not logged in.
    async fn logout(&self) -> PlatformResult<()>;
}

/// Category listing.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// All categories, normalized. `parent_id` links nested categories.
    async fn categories(&self) -> PlatformResult<Vec<Category>>;
}

/// Product listing and lookup.
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Products, optionally restricted to one category.
    async fn products(&self, category_id: Option<&str>) -> PlatformResult<Vec<ExtendedProduct>>;

    /// A single product by canonical id.
    async fn product(&self, id: &str) -> PlatformResult<ExtendedProduct>;
}

/// The basket contract. Every mutator returns the recomputed snapshot.
#[async_trait]
pub trait BasketService: Send + Sync {
    /// Adds a line, merging with an existing line for the same product.
    async fn add_line(&self, line: BasketLine) -> PlatformResult<Basket>;

    /// Removes a line. A no-op (not an error) when absent.
    async fn remove_line(&self, product_id: &str) -> PlatformResult<Basket>;

    /// Sets a line's quantity. `quantity <= 0` removes the line; a missing
    /// line is a hard error.
    async fn update_quantity(&self, product_id: &str, quantity: i64) -> PlatformResult<Basket>;

    /// Empties the basket.
    async fn clear(&self) -> PlatformResult<Basket>;

    /// Applies a discount code. Unknown codes are a benign no-op.
    async fn apply_discount(&self, code: &str) -> PlatformResult<Basket>;

    /// Removes any applied discount.
    async fn remove_discount(&self) -> PlatformResult<Basket>;

    /// Current snapshot without mutating.
    async fn basket(&self) -> PlatformResult<Basket>;
}

/// Cross-sell suggestions and upgrade offers.
#[async_trait]
pub trait CrossSellService: Send + Sync {
    /// Products to suggest alongside the given ones.
    async fn suggestions(&self, product_ids: &[String]) -> PlatformResult<Vec<ExtendedProduct>>;

    /// Resolves an upgrade offer to the product the kiosk should add.
    ///
    /// Adapters that cannot express upgrade offers against their platform
    /// return [`crate::error::PlatformError::Unimplemented`] - never a
    /// silent success.
    async fn apply_upgrade(&self, offer_id: &str) -> PlatformResult<ExtendedProduct>;
}

/// Splash/attract-screen content.
#[async_trait]
pub trait CmsService: Send + Sync {
    /// Splash content. Non-critical: adapters log and degrade to
    /// [`CmsContent::default_splash`] on fetch failure.
    async fn splash(&self) -> PlatformResult<CmsContent>;
}

/// Checkout orchestration against the platform.
///
/// ## Flow
/// `create_checkout` → draft id → `checkout_data` → caller picks a method →
/// `process_payment` → `confirm_order`.
///
/// This path never silently degrades: any failure propagates, and a failure
/// during `create_checkout` means any id obtained so far is invalid.
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Maps the basket to a platform draft order and returns its id.
    async fn create_checkout(&self, basket: &Basket) -> PlatformResult<String>;

    /// The normalized checkout result. `payment_methods` is never empty.
    async fn checkout_data(&self, checkout_id: &str) -> PlatformResult<CheckoutData>;

    /// Pass-through payment capture on the platform.
    async fn process_payment(
        &self,
        checkout_id: &str,
        method_id: &str,
    ) -> PlatformResult<PaymentOutcome>;

    /// Pass-through order finalization on the platform.
    async fn confirm_order(&self, checkout_id: &str) -> PlatformResult<OrderConfirmation>;
}

/// Adapter lifecycle.
#[async_trait]
pub trait PlatformLifecycle: Send + Sync {
    /// Which platform this adapter talks to.
    fn platform(&self) -> Platform;

    /// Validates connectivity (a lightweight categories call) and fails
    /// fast with a wrapped error if the backend is unreachable.
    async fn initialize(&self) -> PlatformResult<()>;

    /// Releases adapter-held resources. Must be safe to call even if
    /// `initialize()` never completed, and must be idempotent.
    async fn dispose(&self) -> PlatformResult<()>;
}

// =============================================================================
// Kiosk Service Bundle
// =============================================================================

/// The composite handle the UI drives: one instance of every capability
/// plus the lifecycle, all backed by a single platform adapter.
#[derive(Clone)]
pub struct KioskService {
    /// Which platform this bundle talks to.
    pub platform: Platform,
    pub auth: Arc<dyn AuthService>,
    pub catalog: Arc<dyn CatalogService>,
    pub products: Arc<dyn ProductService>,
    pub basket: Arc<dyn BasketService>,
    pub cross_sell: Arc<dyn CrossSellService>,
    pub cms: Arc<dyn CmsService>,
    pub checkout: Arc<dyn CheckoutService>,
    lifecycle: Arc<dyn PlatformLifecycle>,
}

impl KioskService {
    /// Assembles a bundle from one adapter and its basket service.
    ///
    /// The basket is kiosk-local on every platform (the ledger lives on the
    /// device; checkout pushes lines to the platform), so it is wired in as
    /// its own instance rather than via the adapter.
    pub fn assemble<A>(adapter: Arc<A>, basket: Arc<dyn BasketService>) -> Self
    where
        A: AuthService
            + CatalogService
            + ProductService
            + CrossSellService
            + CmsService
            + CheckoutService
            + PlatformLifecycle
            + 'static,
    {
        KioskService {
            platform: adapter.platform(),
            auth: adapter.clone(),
            catalog: adapter.clone(),
            products: adapter.clone(),
            basket,
            cross_sell: adapter.clone(),
            cms: adapter.clone(),
            checkout: adapter.clone(),
            lifecycle: adapter,
        }
    }

    /// Validates connectivity against the backend.
    pub async fn initialize(&self) -> PlatformResult<()> {
        self.lifecycle.initialize().await
    }

    /// Releases the bundle's resources.
    pub async fn dispose(&self) -> PlatformResult<()> {
        self.lifecycle.dispose().await
    }
}

impl std::fmt::Debug for KioskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KioskService")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}
