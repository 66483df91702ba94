//! # Magento Adapter
//!
//! Talks to the Magento 2 REST API (`rest/V1`) with an admin integration
//! token.
//!
//! ## Identifier Shape
//! Magento is SKU-keyed: catalog search returns numeric entity ids, but the
//! cart API only accepts SKUs. The adapter canonicalizes on the numeric id
//! and remembers id → SKU as it serves catalog calls, resolving on demand at
//! checkout when a line was never seen by this instance.
//!
//! ## Checkout Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_checkout    POST guest-carts, then POST items per line          │
//! │                     (any line failure aborts: the cart id is dead)      │
//! │  checkout_data      GET  payment-methods + GET totals                   │
//! │  process_payment    PUT  payment-information  → order id               │
//! │  confirm_order      GET  orders/{order_id}                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kiosk_core::basket::Basket;
use kiosk_core::money::to_cents;
use kiosk_core::types::{
    AuthToken, Category, CheckoutData, CmsContent, ExtendedProduct, OrderConfirmation,
    PaymentMethodInfo, PaymentOutcome, Platform, Product, User,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::checkout::{merge_payment_methods, processor_payment_methods, require_non_empty};
use crate::config::PaymentProcessorConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::http::{AuthScheme, PlatformHttp};
use crate::service::{
    AuthService, CatalogService, CheckoutService, CmsService, CrossSellService,
    PlatformLifecycle, ProductService,
};

const REST: &str = "rest/V1";

// =============================================================================
// Wire Types
// =============================================================================

/// Magento reports decimals sometimes as numbers, sometimes as strings,
/// depending on version and endpoint.
fn de_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
        Missing(()),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(n) => Ok(Some(n)),
        Decimal::Text(s) if s.is_empty() => Ok(None),
        Decimal::Text(s) => s
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("unparseable decimal {s:?}"))),
        Decimal::Missing(()) => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct MagentoCategoryTree {
    id: i64,
    name: String,
    #[serde(default)]
    children_data: Vec<MagentoCategoryTree>,
}

#[derive(Debug, Deserialize)]
struct MagentoSearchResults<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MagentoProduct {
    id: i64,
    sku: String,
    name: String,
    #[serde(default, deserialize_with = "de_decimal")]
    price: Option<f64>,
    #[serde(default)]
    custom_attributes: Vec<MagentoAttribute>,
}

#[derive(Debug, Deserialize)]
struct MagentoAttribute {
    attribute_code: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MagentoLinkedProduct {
    linked_product_sku: String,
}

#[derive(Debug, Deserialize)]
struct MagentoPaymentMethod {
    code: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MagentoTotals {
    #[serde(default, deserialize_with = "de_decimal")]
    grand_total: Option<f64>,
    quote_currency_code: String,
}

#[derive(Debug, Deserialize)]
struct MagentoOrder {
    entity_id: i64,
    increment_id: String,
    status: String,
    #[serde(default, deserialize_with = "de_decimal")]
    grand_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MagentoCmsPage {
    title: String,
    content_heading: Option<String>,
}

/// An order/quote total must be present on the payment path. A missing
/// `grand_total` becomes a decode error, never a zero-cent total the kiosk
/// would happily render as "nothing due".
fn require_grand_total(grand_total: Option<f64>) -> PlatformResult<i64> {
    grand_total
        .map(to_cents)
        .ok_or_else(|| PlatformError::Decode {
            platform: Platform::Magento,
            reason: "totals missing grand_total".to_string(),
        })
}

impl MagentoProduct {
    fn attribute(&self, code: &str) -> Option<&str> {
        self.custom_attributes
            .iter()
            .find(|a| a.attribute_code == code)
            .and_then(|a| a.value.as_str())
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Magento 2 REST adapter.
pub struct MagentoAdapter {
    http: PlatformHttp,
    base_url: String,
    payment_processor: Option<PaymentProcessorConfig>,
    currency: String,
    /// Canonical product id → SKU, learned from catalog calls.
    skus: Mutex<HashMap<String, String>>,
    /// Checkout (quote) id → platform order id, recorded by process_payment.
    orders: Mutex<HashMap<String, String>>,
}

impl MagentoAdapter {
    pub fn new(
        base_url: &str,
        access_token: &str,
        payment_processor: Option<PaymentProcessorConfig>,
        currency: &str,
    ) -> PlatformResult<Self> {
        let http = PlatformHttp::new(
            Platform::Magento,
            base_url,
            AuthScheme::Bearer(access_token.to_string()),
        )?;
        Ok(MagentoAdapter {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            payment_processor,
            currency: currency.to_string(),
            skus: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
        })
    }

    fn translate_product(&self, wire: MagentoProduct) -> PlatformResult<ExtendedProduct> {
        let product_id = wire.id.to_string();
        self.skus
            .lock()
            .expect("sku map mutex poisoned")
            .insert(product_id.clone(), wire.sku.clone());

        let price_cents = wire.price.map(to_cents).unwrap_or(0);
        let image_url = wire
            .attribute("image")
            .map(|path| format!("{}/media/catalog/product{path}", self.base_url));
        let description = wire
            .attribute("short_description")
            .or_else(|| wire.attribute("description"))
            .unwrap_or_default()
            .to_string();
        let category_id = self
            .attribute_id_list(&wire, "category_ids")
            .into_iter()
            .next();

        let raw = json!({ "id": wire.id, "sku": wire.sku });
        Ok(ExtendedProduct::with_platform_data(
            Product {
                id: product_id,
                name: wire.name,
                description,
                price_cents,
                currency: self.currency.clone(),
                category_id,
                image_url,
                sku: Some(wire.sku),
            },
            Platform::Magento,
            raw,
        ))
    }

    /// `category_ids` arrives as a JSON array of strings.
    fn attribute_id_list(&self, wire: &MagentoProduct, code: &str) -> Vec<String> {
        wire.custom_attributes
            .iter()
            .find(|a| a.attribute_code == code)
            .and_then(|a| a.value.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The SKU for a canonical product id, fetching when unknown.
    async fn sku_for(&self, product_id: &str) -> PlatformResult<String> {
        let known = self
            .skus
            .lock()
            .expect("sku map mutex poisoned")
            .get(product_id)
            .cloned();
        if let Some(sku) = known {
            return Ok(sku);
        }

        // Populates the map as a side effect.
        let product = self.product(product_id).await?;
        product.product.sku.ok_or_else(|| PlatformError::NotFound {
            platform: Platform::Magento,
            resource: "product sku",
            id: product_id.to_string(),
        })
    }

    async fn product_by_sku(&self, sku: &str) -> PlatformResult<ExtendedProduct> {
        let wire: MagentoProduct = self
            .http
            .get_json(&format!("{REST}/products/{sku}"))
            .await?;
        self.translate_product(wire)
    }

    fn order_for(&self, checkout_id: &str) -> PlatformResult<String> {
        self.orders
            .lock()
            .expect("order map mutex poisoned")
            .get(checkout_id)
            .cloned()
            .ok_or_else(|| PlatformError::Checkout {
                platform: Platform::Magento,
                reason: format!("checkout {checkout_id} has no captured payment"),
            })
    }
}

/// Flattens Magento's nested category tree, dropping the synthetic root.
fn flatten_categories(tree: MagentoCategoryTree) -> Vec<Category> {
    fn walk(node: MagentoCategoryTree, parent_id: Option<String>, out: &mut Vec<Category>) {
        let id = node.id.to_string();
        out.push(Category {
            id: id.clone(),
            name: node.name,
            parent_id,
            image_url: None,
        });
        for child in node.children_data {
            walk(child, Some(id.clone()), out);
        }
    }

    let mut out = Vec::new();
    // The tree root is the store's root category, never shown on a kiosk.
    for child in tree.children_data {
        walk(child, None, &mut out);
    }
    out
}

/// The cart-item body the guest-cart API expects: nested under `cartItem`
/// and carrying the quote id again alongside SKU and quantity.
fn cart_item_payload(cart_id: &str, sku: &str, qty: i64) -> serde_json::Value {
    json!({
        "cartItem": {
            "quote_id": cart_id,
            "sku": sku,
            "qty": qty,
        }
    })
}

/// searchCriteria query string for a single equality filter.
fn search_criteria(field: &str, value: &str, page_size: u32) -> String {
    format!(
        "searchCriteria[filterGroups][0][filters][0][field]={field}\
         &searchCriteria[filterGroups][0][filters][0][value]={value}\
         &searchCriteria[filterGroups][0][filters][0][conditionType]=eq\
         &searchCriteria[pageSize]={page_size}"
    )
}

// =============================================================================
// Capability Implementations
// =============================================================================

#[async_trait]
impl AuthService for MagentoAdapter {
    async fn login(&self, username: &str, password: &str) -> PlatformResult<(AuthToken, User)> {
        // Customer token endpoint returns a bare JSON string.
        let token: String = self
            .http
            .post_json(
                &format!("{REST}/integration/customer/token"),
                &json!({ "username": username, "password": password }),
            )
            .await
            .map_err(|e| match e {
                PlatformError::Http { status: 401, .. } => PlatformError::Auth {
                    platform: Platform::Magento,
                    reason: "invalid credentials".to_string(),
                },
                other => other,
            })?;

        info!(username = %username, "magento login");
        Ok((
            AuthToken {
                token,
                expires_at: None,
            },
            User {
                id: username.to_string(),
                username: username.to_string(),
                display_name: username.to_string(),
                roles: vec!["customer".to_string()],
            },
        ))
    }

    async fn logout(&self) -> PlatformResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CatalogService for MagentoAdapter {
    async fn categories(&self) -> PlatformResult<Vec<Category>> {
        let tree: MagentoCategoryTree = self.http.get_json(&format!("{REST}/categories")).await?;
        Ok(flatten_categories(tree))
    }
}

#[async_trait]
impl ProductService for MagentoAdapter {
    async fn products(&self, category_id: Option<&str>) -> PlatformResult<Vec<ExtendedProduct>> {
        let query = match category_id {
            Some(id) => search_criteria("category_id", id, 100),
            None => "searchCriteria[pageSize]=100".to_string(),
        };
        let results: MagentoSearchResults<MagentoProduct> = self
            .http
            .get_json(&format!("{REST}/products?{query}"))
            .await?;
        results
            .items
            .into_iter()
            .map(|p| self.translate_product(p))
            .collect()
    }

    async fn product(&self, id: &str) -> PlatformResult<ExtendedProduct> {
        let query = search_criteria("entity_id", id, 1);
        let results: MagentoSearchResults<MagentoProduct> = self
            .http
            .get_json(&format!("{REST}/products?{query}"))
            .await?;
        let wire = results
            .items
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound {
                platform: Platform::Magento,
                resource: "product",
                id: id.to_string(),
            })?;
        self.translate_product(wire)
    }
}

#[async_trait]
impl CrossSellService for MagentoAdapter {
    async fn suggestions(&self, product_ids: &[String]) -> PlatformResult<Vec<ExtendedProduct>> {
        let Some(seed) = product_ids.first() else {
            return Ok(Vec::new());
        };

        let sku = self.sku_for(seed).await?;
        let links: Vec<MagentoLinkedProduct> = self
            .http
            .get_json(&format!("{REST}/products/{sku}/links/crosssell"))
            .await?;

        let mut suggested = Vec::with_capacity(links.len());
        for link in links {
            let product = self.product_by_sku(&link.linked_product_sku).await?;
            if !product_ids.contains(&product.product.id) {
                suggested.push(product);
            }
        }
        Ok(suggested)
    }

    async fn apply_upgrade(&self, _offer_id: &str) -> PlatformResult<ExtendedProduct> {
        Err(PlatformError::Unimplemented {
            platform: Platform::Magento,
            feature: "upgrade offers",
        })
    }
}

#[async_trait]
impl CmsService for MagentoAdapter {
    async fn splash(&self) -> PlatformResult<CmsContent> {
        let query = search_criteria("identifier", "kiosk-splash", 1);
        let result: PlatformResult<MagentoSearchResults<MagentoCmsPage>> = self
            .http
            .get_json(&format!("{REST}/cmsPage/search?{query}"))
            .await;

        match result {
            Ok(results) => match results.items.into_iter().next() {
                Some(page) => Ok(CmsContent {
                    title: page.title,
                    subtitle: page.content_heading.filter(|s| !s.is_empty()),
                    image_url: None,
                    body: None,
                }),
                None => Ok(CmsContent::default_splash()),
            },
            Err(e) => {
                warn!(error = %e, "magento splash fetch failed, using default");
                Ok(CmsContent::default_splash())
            }
        }
    }
}

#[async_trait]
impl CheckoutService for MagentoAdapter {
    async fn create_checkout(&self, basket: &Basket) -> PlatformResult<String> {
        require_non_empty(Platform::Magento, basket)?;

        // Guest cart creation returns a bare masked id string.
        let cart_id: String = self
            .http
            .post_json(&format!("{REST}/guest-carts"), &json!({}))
            .await?;

        for line in &basket.lines {
            let sku = self.sku_for(&line.product_id).await?;
            let result: PlatformResult<serde_json::Value> = self
                .http
                .post_json(
                    &format!("{REST}/guest-carts/{cart_id}/items"),
                    &cart_item_payload(&cart_id, &sku, line.quantity),
                )
                .await;

            // A half-filled cart must not be paid for; the id dies here.
            if let Err(e) = result {
                return Err(PlatformError::Checkout {
                    platform: Platform::Magento,
                    reason: format!(
                        "failed to add {sku} to cart {cart_id}, cart abandoned: {e}"
                    ),
                });
            }
        }

        debug!(cart_id = %cart_id, "magento guest cart created");
        Ok(cart_id)
    }

    async fn checkout_data(&self, checkout_id: &str) -> PlatformResult<CheckoutData> {
        let methods: Vec<MagentoPaymentMethod> = self
            .http
            .get_json(&format!("{REST}/guest-carts/{checkout_id}/payment-methods"))
            .await?;
        let totals: MagentoTotals = self
            .http
            .get_json(&format!("{REST}/guest-carts/{checkout_id}/totals"))
            .await?;

        let platform_methods: Vec<PaymentMethodInfo> = methods
            .into_iter()
            .map(|m| PaymentMethodInfo {
                id: m.code,
                label: m.title,
                processor: "magento".to_string(),
            })
            .collect();

        Ok(CheckoutData {
            id: checkout_id.to_string(),
            payment_methods: merge_payment_methods(
                platform_methods,
                processor_payment_methods(self.payment_processor.as_ref()),
            ),
            total_cents: require_grand_total(totals.grand_total)?,
            currency: totals.quote_currency_code,
            expires_at: None,
        })
    }

    async fn process_payment(
        &self,
        checkout_id: &str,
        method_id: &str,
    ) -> PlatformResult<PaymentOutcome> {
        let totals: MagentoTotals = self
            .http
            .get_json(&format!("{REST}/guest-carts/{checkout_id}/totals"))
            .await?;
        // Checked before any money moves.
        let total_cents = require_grand_total(totals.grand_total)?;

        // Placing payment information converts the quote into an order and
        // returns the new order id.
        let order_id: serde_json::Value = self
            .http
            .put_json(
                &format!("{REST}/guest-carts/{checkout_id}/payment-information"),
                &json!({
                    "paymentMethod": { "method": method_id },
                    "email": "kiosk@store.local",
                }),
            )
            .await?;
        let order_id = match order_id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(PlatformError::Decode {
                    platform: Platform::Magento,
                    reason: format!("unexpected payment-information response: {other}"),
                })
            }
        };

        self.orders
            .lock()
            .expect("order map mutex poisoned")
            .insert(checkout_id.to_string(), order_id.clone());

        info!(checkout_id = %checkout_id, order_id = %order_id, "magento payment placed");
        Ok(PaymentOutcome {
            id: order_id.clone(),
            status: "paid".to_string(),
            total_cents,
            platform: Platform::Magento,
            raw: json!({ "cartId": checkout_id, "orderId": order_id }),
        })
    }

    async fn confirm_order(&self, checkout_id: &str) -> PlatformResult<OrderConfirmation> {
        let order_id = self.order_for(checkout_id)?;
        let order: MagentoOrder = self
            .http
            .get_json(&format!("{REST}/orders/{order_id}"))
            .await?;

        info!(order_id = %order.increment_id, "magento order confirmed");
        Ok(OrderConfirmation {
            order_id: order.increment_id.clone(),
            status: order.status,
            total_cents: require_grand_total(order.grand_total)?,
            platform: Platform::Magento,
            raw: json!({ "entityId": order.entity_id, "incrementId": order.increment_id }),
        })
    }
}

#[async_trait]
impl PlatformLifecycle for MagentoAdapter {
    fn platform(&self) -> Platform {
        Platform::Magento
    }

    async fn initialize(&self) -> PlatformResult<()> {
        let tree: MagentoCategoryTree = self.http.get_json(&format!("{REST}/categories")).await?;
        info!(root_category = tree.id, "magento platform ready");
        Ok(())
    }

    async fn dispose(&self) -> PlatformResult<()> {
        self.skus.lock().expect("sku map mutex poisoned").clear();
        self.orders.lock().expect("order map mutex poisoned").clear();
        info!("magento platform disposed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_decimal_accepts_number_and_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default, deserialize_with = "de_decimal")]
            value: Option<f64>,
        }

        let n: Wrapper = serde_json::from_str(r#"{"value": 12.95}"#).unwrap();
        assert_eq!(n.value, Some(12.95));

        let s: Wrapper = serde_json::from_str(r#"{"value": "12.95"}"#).unwrap();
        assert_eq!(s.value, Some(12.95));

        let empty: Wrapper = serde_json::from_str(r#"{"value": ""}"#).unwrap();
        assert_eq!(empty.value, None);

        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "n/a"}"#).is_err());
    }

    #[test]
    fn test_flatten_drops_synthetic_root() {
        let tree: MagentoCategoryTree = serde_json::from_str(
            r#"{
                "id": 2, "name": "Root",
                "children_data": [
                    {"id": 10, "name": "Drinks", "children_data": [
                        {"id": 11, "name": "Hot Drinks", "children_data": []}
                    ]},
                    {"id": 20, "name": "Food", "children_data": []}
                ]
            }"#,
        )
        .unwrap();

        let flat = flatten_categories(tree);
        assert_eq!(flat.len(), 3);
        assert!(flat.iter().all(|c| c.id != "2"));

        let drinks = flat.iter().find(|c| c.id == "10").unwrap();
        assert_eq!(drinks.parent_id, None);
        let hot = flat.iter().find(|c| c.id == "11").unwrap();
        assert_eq!(hot.parent_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_totals_without_grand_total_are_a_hard_error() {
        // Some Magento configurations omit grand_total from the totals
        // payload; that must never surface as a zero-cent amount due.
        let totals: MagentoTotals =
            serde_json::from_str(r#"{"quote_currency_code": "GBP"}"#).unwrap();
        assert_eq!(totals.grand_total, None);
        assert!(matches!(
            require_grand_total(totals.grand_total),
            Err(PlatformError::Decode { .. })
        ));

        assert_eq!(require_grand_total(Some(12.95)).unwrap(), 1295);
    }

    #[test]
    fn test_cart_item_payload_shape() {
        let payload = cart_item_payload("mc-1", "LATTE", 2);
        assert_eq!(
            payload,
            serde_json::json!({
                "cartItem": { "quote_id": "mc-1", "sku": "LATTE", "qty": 2 }
            })
        );
    }

    #[test]
    fn test_search_criteria_query() {
        let query = search_criteria("entity_id", "42", 1);
        assert!(query.contains("[field]=entity_id"));
        assert!(query.contains("[value]=42"));
        assert!(query.contains("[conditionType]=eq"));
        assert!(query.contains("searchCriteria[pageSize]=1"));
    }

    #[test]
    fn test_product_custom_attribute_lookup() {
        let wire: MagentoProduct = serde_json::from_str(
            r#"{
                "id": 7, "sku": "LATTE", "name": "Latte", "price": "3.50",
                "custom_attributes": [
                    {"attribute_code": "short_description", "value": "Hot and milky"},
                    {"attribute_code": "image", "value": "/l/a/latte.png"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(wire.attribute("short_description"), Some("Hot and milky"));
        assert_eq!(wire.attribute("image"), Some("/l/a/latte.png"));
        assert_eq!(wire.attribute("missing"), None);
        assert_eq!(wire.price, Some(3.5));
    }
}
