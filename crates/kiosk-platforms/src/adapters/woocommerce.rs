//! # WooCommerce Adapter
//!
//! Talks to the WooCommerce REST API (`wp-json/wc/v3`) with Basic auth over
//! the consumer key/secret pair.
//!
//! ## Checkout Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_checkout    POST orders { line_items, status: "pending" }       │
//! │  checkout_data      GET  orders/{id} + GET payment_gateways             │
//! │  process_payment    PUT  orders/{id} { set_paid: true }                 │
//! │  confirm_order      PUT  orders/{id} { status: "completed" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Woo reports money as decimal strings and numeric ids; both are normalized
//! at this boundary (cents and string ids respectively).

use async_trait::async_trait;
use chrono::{Duration, Utc};
use kiosk_core::basket::Basket;
use kiosk_core::money::to_cents;
use kiosk_core::types::{
    AuthToken, Category, CheckoutData, CmsContent, ExtendedProduct, OrderConfirmation,
    PaymentMethodInfo, PaymentOutcome, Platform, Product, User,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::checkout::{
    merge_payment_methods, numeric_product_id, processor_payment_methods, require_non_empty,
};
use crate::config::PaymentProcessorConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::http::{basic_auth_value, AuthScheme, PlatformHttp};
use crate::service::{
    AuthService, CatalogService, CheckoutService, CmsService, CrossSellService,
    PlatformLifecycle, ProductService,
};

const WC_API: &str = "wp-json/wc/v3";
const WP_API: &str = "wp-json/wp/v2";

/// Woo root categories use parent 0, not null.
const ROOT_PARENT: i64 = 0;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WooCategory {
    id: i64,
    name: String,
    parent: i64,
    image: Option<WooImage>,
}

#[derive(Debug, Deserialize)]
struct WooImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct WooProduct {
    id: i64,
    name: String,
    #[serde(default)]
    short_description: String,
    /// Decimal string, e.g. `"12.95"`. Empty for unpurchasable products.
    price: String,
    sku: Option<String>,
    #[serde(default)]
    categories: Vec<WooCategoryRef>,
    #[serde(default)]
    images: Vec<WooImage>,
    #[serde(default)]
    cross_sell_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct WooCategoryRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WooOrder {
    id: i64,
    status: String,
    /// Decimal string total.
    total: String,
    currency: String,
    #[serde(default)]
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct WooGateway {
    id: String,
    title: String,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct WpPage {
    title: WpRendered,
    excerpt: WpRendered,
}

#[derive(Debug, Deserialize)]
struct WpRendered {
    rendered: String,
}

fn parse_woo_money(platform: Platform, raw: &str) -> PlatformResult<i64> {
    if raw.is_empty() {
        return Ok(0);
    }
    let amount: f64 = raw.parse().map_err(|_| PlatformError::Decode {
        platform,
        reason: format!("unparseable money amount {raw:?}"),
    })?;
    Ok(to_cents(amount))
}

/// Order totals are stricter than product prices: an unpurchasable product
/// legitimately reports an empty price, but an order with no total must
/// never render as zero due on the payment path.
fn parse_order_total(raw: &str) -> PlatformResult<i64> {
    if raw.is_empty() {
        return Err(PlatformError::Decode {
            platform: Platform::WooCommerce,
            reason: "order is missing its total".to_string(),
        });
    }
    parse_woo_money(Platform::WooCommerce, raw)
}

// =============================================================================
// Adapter
// =============================================================================

/// WooCommerce REST adapter.
pub struct WooCommerceAdapter {
    http: PlatformHttp,
    consumer_key: String,
    consumer_secret: String,
    payment_processor: Option<PaymentProcessorConfig>,
    currency: String,
}

impl WooCommerceAdapter {
    pub fn new(
        base_url: &str,
        consumer_key: &str,
        consumer_secret: &str,
        payment_processor: Option<PaymentProcessorConfig>,
        currency: &str,
    ) -> PlatformResult<Self> {
        let http = PlatformHttp::new(
            Platform::WooCommerce,
            base_url,
            AuthScheme::Basic {
                key: consumer_key.to_string(),
                secret: consumer_secret.to_string(),
            },
        )?;
        Ok(WooCommerceAdapter {
            http,
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            payment_processor,
            currency: currency.to_string(),
        })
    }

    fn translate_product(&self, wire: WooProduct) -> PlatformResult<ExtendedProduct> {
        let price_cents = parse_woo_money(Platform::WooCommerce, &wire.price)?;
        let raw = json!({
            "id": wire.id,
            "crossSellIds": wire.cross_sell_ids,
        });

        Ok(ExtendedProduct::with_platform_data(
            Product {
                id: wire.id.to_string(),
                name: wire.name,
                description: strip_tags(&wire.short_description),
                price_cents,
                currency: self.currency.clone(),
                category_id: wire.categories.first().map(|c| c.id.to_string()),
                image_url: wire.images.into_iter().next().map(|i| i.src),
                sku: wire.sku.filter(|s| !s.is_empty()),
            },
            Platform::WooCommerce,
            raw,
        ))
    }

    async fn fetch_order(&self, order_id: &str) -> PlatformResult<WooOrder> {
        let id = numeric_product_id(Platform::WooCommerce, order_id)?;
        self.http.get_json(&format!("{WC_API}/orders/{id}")).await
    }
}

/// Woo renders descriptions as HTML fragments; the kiosk wants plain text.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

// =============================================================================
// Capability Implementations
// =============================================================================

#[async_trait]
impl AuthService for WooCommerceAdapter {
    async fn login(&self, username: &str, _password: &str) -> PlatformResult<(AuthToken, User)> {
        // Woo REST auth is the key pair itself; "login" verifies it works
        // with a cheap authenticated call and issues a kiosk-local token.
        let _: Vec<WooCategory> = self
            .http
            .get_json(&format!("{WC_API}/products/categories?per_page=1"))
            .await
            .map_err(|e| PlatformError::Auth {
                platform: Platform::WooCommerce,
                reason: format!("credential check failed: {e}"),
            })?;

        info!(username = %username, "woocommerce operator session opened");
        Ok((
            AuthToken {
                token: basic_auth_value(&self.consumer_key, &self.consumer_secret),
                expires_at: None,
            },
            User {
                id: username.to_string(),
                username: username.to_string(),
                display_name: username.to_string(),
                roles: vec!["operator".to_string()],
            },
        ))
    }

    async fn logout(&self) -> PlatformResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CatalogService for WooCommerceAdapter {
    async fn categories(&self) -> PlatformResult<Vec<Category>> {
        let wire: Vec<WooCategory> = self
            .http
            .get_json(&format!("{WC_API}/products/categories?per_page=100"))
            .await?;

        Ok(wire
            .into_iter()
            .map(|c| Category {
                id: c.id.to_string(),
                name: c.name,
                parent_id: (c.parent != ROOT_PARENT).then(|| c.parent.to_string()),
                image_url: c.image.map(|i| i.src),
            })
            .collect())
    }
}

#[async_trait]
impl ProductService for WooCommerceAdapter {
    async fn products(&self, category_id: Option<&str>) -> PlatformResult<Vec<ExtendedProduct>> {
        let path = match category_id {
            Some(id) => {
                let id = numeric_product_id(Platform::WooCommerce, id)?;
                format!("{WC_API}/products?per_page=100&category={id}")
            }
            None => format!("{WC_API}/products?per_page=100"),
        };
        let wire: Vec<WooProduct> = self.http.get_json(&path).await?;
        wire.into_iter().map(|p| self.translate_product(p)).collect()
    }

    async fn product(&self, id: &str) -> PlatformResult<ExtendedProduct> {
        let numeric = numeric_product_id(Platform::WooCommerce, id)?;
        let wire: WooProduct = self
            .http
            .get_json(&format!("{WC_API}/products/{numeric}"))
            .await
            .map_err(|e| match e {
                PlatformError::Http { status: 404, .. } => PlatformError::NotFound {
                    platform: Platform::WooCommerce,
                    resource: "product",
                    id: id.to_string(),
                },
                other => other,
            })?;
        self.translate_product(wire)
    }
}

#[async_trait]
impl CrossSellService for WooCommerceAdapter {
    async fn suggestions(&self, product_ids: &[String]) -> PlatformResult<Vec<ExtendedProduct>> {
        // Woo models cross-sells per product; union them across the basket.
        let mut suggested: Vec<ExtendedProduct> = Vec::new();
        for id in product_ids {
            let product = self.product(id).await?;
            let cross_sell_ids: Vec<i64> = product
                .platform_data
                .get(&Platform::WooCommerce)
                .and_then(|raw| raw.get("crossSellIds"))
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();

            for cross_id in cross_sell_ids {
                let cross_id = cross_id.to_string();
                let already_in_basket = product_ids.contains(&cross_id);
                let already_suggested = suggested.iter().any(|p| p.product.id == cross_id);
                if !already_in_basket && !already_suggested {
                    suggested.push(self.product(&cross_id).await?);
                }
            }
        }
        Ok(suggested)
    }

    async fn apply_upgrade(&self, _offer_id: &str) -> PlatformResult<ExtendedProduct> {
        Err(PlatformError::Unimplemented {
            platform: Platform::WooCommerce,
            feature: "upgrade offers",
        })
    }
}

#[async_trait]
impl CmsService for WooCommerceAdapter {
    async fn splash(&self) -> PlatformResult<CmsContent> {
        let result: PlatformResult<Vec<WpPage>> = self
            .http
            .get_json(&format!("{WP_API}/pages?slug=kiosk-splash"))
            .await;

        match result {
            Ok(pages) => match pages.into_iter().next() {
                Some(page) => Ok(CmsContent {
                    title: strip_tags(&page.title.rendered),
                    subtitle: Some(strip_tags(&page.excerpt.rendered)).filter(|s| !s.is_empty()),
                    image_url: None,
                    body: None,
                }),
                None => Ok(CmsContent::default_splash()),
            },
            Err(e) => {
                warn!(error = %e, "woocommerce splash fetch failed, using default");
                Ok(CmsContent::default_splash())
            }
        }
    }
}

#[async_trait]
impl CheckoutService for WooCommerceAdapter {
    async fn create_checkout(&self, basket: &Basket) -> PlatformResult<String> {
        require_non_empty(Platform::WooCommerce, basket)?;

        let mut line_items = Vec::with_capacity(basket.lines.len());
        for line in &basket.lines {
            line_items.push(json!({
                "product_id": numeric_product_id(Platform::WooCommerce, &line.product_id)?,
                "quantity": line.quantity,
            }));
        }

        let order: WooOrder = self
            .http
            .post_json(
                &format!("{WC_API}/orders"),
                &json!({
                    "status": "pending",
                    "currency": basket.currency,
                    "line_items": line_items,
                }),
            )
            .await?;

        debug!(order_id = order.id, "woocommerce draft order created");
        Ok(order.id.to_string())
    }

    async fn checkout_data(&self, checkout_id: &str) -> PlatformResult<CheckoutData> {
        let order = self.fetch_order(checkout_id).await?;

        let gateways: Vec<WooGateway> = self
            .http
            .get_json(&format!("{WC_API}/payment_gateways"))
            .await?;
        let platform_methods: Vec<PaymentMethodInfo> = gateways
            .into_iter()
            .filter(|g| g.enabled)
            .map(|g| PaymentMethodInfo {
                id: g.id,
                label: g.title,
                processor: "woocommerce".to_string(),
            })
            .collect();

        Ok(CheckoutData {
            id: order.id.to_string(),
            payment_methods: merge_payment_methods(
                platform_methods,
                processor_payment_methods(self.payment_processor.as_ref()),
            ),
            total_cents: parse_order_total(&order.total)?,
            currency: order.currency,
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        })
    }

    async fn process_payment(
        &self,
        checkout_id: &str,
        method_id: &str,
    ) -> PlatformResult<PaymentOutcome> {
        let id = numeric_product_id(Platform::WooCommerce, checkout_id)?;
        let order: WooOrder = self
            .http
            .put_json(
                &format!("{WC_API}/orders/{id}"),
                &json!({ "payment_method": method_id, "set_paid": true }),
            )
            .await?;

        let raw = json!({ "orderId": order.id, "transactionId": order.transaction_id });
        Ok(PaymentOutcome {
            id: if order.transaction_id.is_empty() {
                order.id.to_string()
            } else {
                order.transaction_id
            },
            status: order.status,
            total_cents: parse_order_total(&order.total)?,
            platform: Platform::WooCommerce,
            raw,
        })
    }

    async fn confirm_order(&self, checkout_id: &str) -> PlatformResult<OrderConfirmation> {
        let id = numeric_product_id(Platform::WooCommerce, checkout_id)?;
        let order: WooOrder = self
            .http
            .put_json(
                &format!("{WC_API}/orders/{id}"),
                &json!({ "status": "completed" }),
            )
            .await?;

        info!(order_id = order.id, "woocommerce order completed");
        let total_cents = parse_order_total(&order.total)?;
        Ok(OrderConfirmation {
            order_id: order.id.to_string(),
            status: order.status,
            total_cents,
            platform: Platform::WooCommerce,
            raw: json!({ "orderId": order.id }),
        })
    }
}

#[async_trait]
impl PlatformLifecycle for WooCommerceAdapter {
    fn platform(&self) -> Platform {
        Platform::WooCommerce
    }

    async fn initialize(&self) -> PlatformResult<()> {
        let _: Vec<WooCategory> = self
            .http
            .get_json(&format!("{WC_API}/products/categories?per_page=1"))
            .await?;
        info!("woocommerce platform ready");
        Ok(())
    }

    async fn dispose(&self) -> PlatformResult<()> {
        // Stateless adapter; orders live platform-side.
        info!("woocommerce platform disposed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
