//! # In-Memory Demo Adapter
//!
//! The built-in demo store: a seeded catalog, simulated auth, and a draft
//! order book held in memory. No network.
//!
//! ## Why It Exists
//! - The kiosk must be demonstrable with zero platform credentials
//! - Integration tests exercise the full capability contract against it
//! - It is the reference for the behavior every remote adapter must match
//!
//! Payment is deterministic here: the terminal interaction is external to
//! this layer, so `process_payment` records a successful capture rather
//! than guessing at terminal outcomes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use kiosk_core::basket::Basket;
use kiosk_core::types::{
    AuthToken, Category, CheckoutData, CmsContent, ExtendedProduct, OrderConfirmation,
    PaymentOutcome, Platform, Product, User,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::checkout::{merge_payment_methods, processor_payment_methods, require_non_empty};
use crate::config::{PaymentProcessorConfig, PlatformConfig};
use crate::error::{PlatformError, PlatformResult};
use crate::service::{
    AuthService, CatalogService, CheckoutService, CmsService, CrossSellService,
    PlatformLifecycle, ProductService,
};

/// The one upgrade offer the demo store knows.
const DEMO_UPGRADE_OFFER: &str = "meal-deal";

/// A platform-side draft order awaiting payment.
#[derive(Debug, Clone)]
struct DraftOrder {
    basket: Basket,
    paid: bool,
}

/// The demo store adapter.
pub struct InMemoryAdapter {
    payment_processor: Option<PaymentProcessorConfig>,
    categories: Vec<Category>,
    products: Vec<ExtendedProduct>,
    drafts: Mutex<HashMap<String, DraftOrder>>,
}

impl InMemoryAdapter {
    /// Builds the demo store from a config (only the processor and currency
    /// matter; there are no credentials).
    pub fn new(config: &PlatformConfig) -> Self {
        let currency = config.kiosk.currency.clone();
        InMemoryAdapter {
            payment_processor: config.payment_processor.clone(),
            categories: seed_categories(),
            products: seed_products(&currency),
            drafts: Mutex::new(HashMap::new()),
        }
    }

    fn draft(&self, checkout_id: &str) -> PlatformResult<DraftOrder> {
        self.drafts
            .lock()
            .expect("draft order mutex poisoned")
            .get(checkout_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                platform: Platform::InMemory,
                resource: "checkout",
                id: checkout_id.to_string(),
            })
    }
}

// =============================================================================
// Seeded Demo Data
// =============================================================================

fn seed_categories() -> Vec<Category> {
    let category = |id: &str, name: &str, parent: Option<&str>| Category {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        image_url: None,
    };

    vec![
        category("drinks", "Drinks", None),
        category("hot-drinks", "Hot Drinks", Some("drinks")),
        category("cold-drinks", "Cold Drinks", Some("drinks")),
        category("food", "Food", None),
    ]
}

fn seed_products(currency: &str) -> Vec<ExtendedProduct> {
    let product = |id: &str, name: &str, price_cents: i64, category: Option<&str>| {
        ExtendedProduct::plain(Product {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} from the demo store"),
            price_cents,
            currency: currency.to_string(),
            category_id: category.map(str::to_string),
            image_url: None,
            sku: Some(format!("DEMO-{}", id.to_uppercase())),
        })
    };

    vec![
        product("p-latte", "Latte", 350, Some("hot-drinks")),
        product("p-cappuccino", "Cappuccino", 330, Some("hot-drinks")),
        product("p-espresso", "Espresso", 250, Some("hot-drinks")),
        product("p-cola", "Cola", 199, Some("cold-drinks")),
        product("p-croissant", "Croissant", 275, Some("food")),
        product("p-toastie", "Cheese Toastie", 495, Some("food")),
        // Upsell-only item, reachable through the upgrade offer.
        product("p-meal-upgrade", "Make It a Meal", 150, None),
    ]
}

// =============================================================================
// Capability Implementations
// =============================================================================

#[async_trait]
impl AuthService for InMemoryAdapter {
    async fn login(&self, username: &str, password: &str) -> PlatformResult<(AuthToken, User)> {
        // Simulated auth: any non-empty credential pair is accepted.
        if username.trim().is_empty() || password.is_empty() {
            return Err(PlatformError::Auth {
                platform: Platform::InMemory,
                reason: "username and password are required".to_string(),
            });
        }

        info!(username = %username, "demo login");
        let token = AuthToken {
            token: Uuid::new_v4().to_string(),
            expires_at: Some(Utc::now() + Duration::hours(8)),
        };
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: username.to_string(),
            roles: vec!["operator".to_string()],
        };
        Ok((token, user))
    }

    async fn logout(&self) -> PlatformResult<()> {
        info!("demo logout");
        Ok(())
    }
}

#[async_trait]
impl CatalogService for InMemoryAdapter {
    async fn categories(&self) -> PlatformResult<Vec<Category>> {
        Ok(self.categories.clone())
    }
}

#[async_trait]
impl ProductService for InMemoryAdapter {
    async fn products(&self, category_id: Option<&str>) -> PlatformResult<Vec<ExtendedProduct>> {
        Ok(self
            .products
            .iter()
            .filter(|p| match category_id {
                Some(id) => p.product.category_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn product(&self, id: &str) -> PlatformResult<ExtendedProduct> {
        self.products
            .iter()
            .find(|p| p.product.id == id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                platform: Platform::InMemory,
                resource: "product",
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl CrossSellService for InMemoryAdapter {
    async fn suggestions(&self, product_ids: &[String]) -> PlatformResult<Vec<ExtendedProduct>> {
        Ok(self
            .products
            .iter()
            .filter(|p| !product_ids.contains(&p.product.id))
            .take(3)
            .cloned()
            .collect())
    }

    async fn apply_upgrade(&self, offer_id: &str) -> PlatformResult<ExtendedProduct> {
        if offer_id != DEMO_UPGRADE_OFFER {
            return Err(PlatformError::NotFound {
                platform: Platform::InMemory,
                resource: "upgrade offer",
                id: offer_id.to_string(),
            });
        }
        self.product("p-meal-upgrade").await
    }
}

#[async_trait]
impl CmsService for InMemoryAdapter {
    async fn splash(&self) -> PlatformResult<CmsContent> {
        Ok(CmsContent {
            title: "Demo Store".to_string(),
            subtitle: Some("Tap anywhere to start your order".to_string()),
            image_url: None,
            body: None,
        })
    }
}

#[async_trait]
impl CheckoutService for InMemoryAdapter {
    async fn create_checkout(&self, basket: &Basket) -> PlatformResult<String> {
        require_non_empty(Platform::InMemory, basket)?;

        let checkout_id = Uuid::new_v4().to_string();
        self.drafts
            .lock()
            .expect("draft order mutex poisoned")
            .insert(
                checkout_id.clone(),
                DraftOrder {
                    basket: basket.clone(),
                    paid: false,
                },
            );

        info!(checkout_id = %checkout_id, total_cents = basket.total_cents, "demo checkout created");
        Ok(checkout_id)
    }

    async fn checkout_data(&self, checkout_id: &str) -> PlatformResult<CheckoutData> {
        let draft = self.draft(checkout_id)?;
        let methods = merge_payment_methods(
            Vec::new(),
            processor_payment_methods(self.payment_processor.as_ref()),
        );

        Ok(CheckoutData {
            id: checkout_id.to_string(),
            payment_methods: methods,
            total_cents: draft.basket.total_cents,
            currency: draft.basket.currency.clone(),
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        })
    }

    async fn process_payment(
        &self,
        checkout_id: &str,
        method_id: &str,
    ) -> PlatformResult<PaymentOutcome> {
        let mut drafts = self.drafts.lock().expect("draft order mutex poisoned");
        let draft = drafts
            .get_mut(checkout_id)
            .ok_or_else(|| PlatformError::NotFound {
                platform: Platform::InMemory,
                resource: "checkout",
                id: checkout_id.to_string(),
            })?;

        draft.paid = true;
        debug!(checkout_id = %checkout_id, method_id = %method_id, "demo payment captured");

        Ok(PaymentOutcome {
            id: format!("pay-{}", Uuid::new_v4()),
            status: "paid".to_string(),
            total_cents: draft.basket.total_cents,
            platform: Platform::InMemory,
            raw: serde_json::json!({ "checkoutId": checkout_id, "methodId": method_id }),
        })
    }

    async fn confirm_order(&self, checkout_id: &str) -> PlatformResult<OrderConfirmation> {
        let draft = self.draft(checkout_id)?;
        if !draft.paid {
            return Err(PlatformError::Checkout {
                platform: Platform::InMemory,
                reason: format!("checkout {checkout_id} has no captured payment"),
            });
        }

        info!(checkout_id = %checkout_id, "demo order confirmed");
        Ok(OrderConfirmation {
            order_id: checkout_id.to_string(),
            status: "completed".to_string(),
            total_cents: draft.basket.total_cents,
            platform: Platform::InMemory,
            raw: serde_json::json!({ "checkoutId": checkout_id }),
        })
    }
}

#[async_trait]
impl PlatformLifecycle for InMemoryAdapter {
    fn platform(&self) -> Platform {
        Platform::InMemory
    }

    async fn initialize(&self) -> PlatformResult<()> {
        info!(products = self.products.len(), "in-memory platform ready");
        Ok(())
    }

    async fn dispose(&self) -> PlatformResult<()> {
        self.drafts
            .lock()
            .expect("draft order mutex poisoned")
            .clear();
        info!("in-memory platform disposed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::basket::{BasketLedger, BasketLine};
    use kiosk_core::types::TaxRate;

    fn adapter() -> InMemoryAdapter {
        InMemoryAdapter::new(&PlatformConfig::in_memory("Demo"))
    }

    fn basket() -> Basket {
        let mut ledger = BasketLedger::new(TaxRate::from_fraction(0.2), "GBP");
        ledger
            .add_line(BasketLine::new("p-latte", "Latte", 2, 350))
            .unwrap()
    }

    #[tokio::test]
    async fn test_category_tree_has_parents() {
        let adapter = adapter();
        let categories = adapter.categories().await.unwrap();
        let hot = categories.iter().find(|c| c.id == "hot-drinks").unwrap();
        assert_eq!(hot.parent_id.as_deref(), Some("drinks"));
    }

    #[tokio::test]
    async fn test_products_filter_by_category() {
        let adapter = adapter();
        let hot = adapter.products(Some("hot-drinks")).await.unwrap();
        assert!(!hot.is_empty());
        assert!(hot
            .iter()
            .all(|p| p.product.category_id.as_deref() == Some("hot-drinks")));
    }

    #[tokio::test]
    async fn test_login_rejects_empty_credentials() {
        let adapter = adapter();
        assert!(adapter.login("", "x").await.is_err());
        assert!(adapter.login("operator", "demo").await.is_ok());
    }

    #[tokio::test]
    async fn test_checkout_data_id_matches_and_methods_non_empty() {
        let adapter = adapter();
        let checkout_id = adapter.create_checkout(&basket()).await.unwrap();

        let data = adapter.checkout_data(&checkout_id).await.unwrap();
        assert_eq!(data.id, checkout_id);
        assert!(!data.payment_methods.is_empty());
        assert_eq!(data.total_cents, basket().total_cents);
    }

    #[tokio::test]
    async fn test_no_processor_falls_back_to_cash() {
        let mut config = PlatformConfig::in_memory("Demo");
        config.payment_processor = None;
        let adapter = InMemoryAdapter::new(&config);

        let checkout_id = adapter.create_checkout(&basket()).await.unwrap();
        let data = adapter.checkout_data(&checkout_id).await.unwrap();
        assert_eq!(data.payment_methods.len(), 1);
        assert_eq!(data.payment_methods[0].id, "cash");
    }

    #[tokio::test]
    async fn test_empty_basket_cannot_checkout() {
        let adapter = adapter();
        let empty = BasketLedger::new(TaxRate::from_fraction(0.2), "GBP").snapshot();
        assert!(matches!(
            adapter.create_checkout(&empty).await,
            Err(PlatformError::Checkout { .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_requires_payment() {
        let adapter = adapter();
        let checkout_id = adapter.create_checkout(&basket()).await.unwrap();

        assert!(adapter.confirm_order(&checkout_id).await.is_err());

        adapter
            .process_payment(&checkout_id, "mock_card")
            .await
            .unwrap();
        let confirmation = adapter.confirm_order(&checkout_id).await.unwrap();
        assert_eq!(confirmation.order_id, checkout_id);
        assert_eq!(confirmation.status, "completed");
    }

    #[tokio::test]
    async fn test_upgrade_offer_resolves_to_product() {
        let adapter = adapter();
        let upgrade = adapter.apply_upgrade("meal-deal").await.unwrap();
        assert_eq!(upgrade.product.id, "p-meal-upgrade");

        assert!(matches!(
            adapter.apply_upgrade("bogus").await,
            Err(PlatformError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispose_clears_drafts() {
        let adapter = adapter();
        let checkout_id = adapter.create_checkout(&basket()).await.unwrap();
        adapter.dispose().await.unwrap();
        assert!(adapter.checkout_data(&checkout_id).await.is_err());
        // dispose is idempotent
        adapter.dispose().await.unwrap();
    }
}
