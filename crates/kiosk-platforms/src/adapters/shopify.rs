//! # Shopify Adapter
//!
//! Talks to the Shopify Storefront GraphQL API.
//!
//! ## Identifier Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shopify GID                              Canonical id                  │
//! │                                                                         │
//! │  gid://shopify/Product/123456  ──tail──►  "123456"                      │
//! │  gid://shopify/Collection/789  ──tail──►  "789"                         │
//! │                                                                         │
//! │  The GID prefix is reconstructible for products and collections, but    │
//! │  NOT for variants: a variant GID is only learned by fetching the        │
//! │  product. The adapter remembers product → variant GID as it serves      │
//! │  catalog calls so checkout can push cart lines later.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment
//! The Storefront API exposes no terminal payment capture, so
//! `process_payment` is an explicit [`PlatformError::Unimplemented`] - the
//! kiosk surfaces it instead of pretending a card was charged.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kiosk_core::basket::Basket;
use kiosk_core::money::to_cents;
use kiosk_core::types::{
    AuthToken, Category, CheckoutData, CmsContent, ExtendedProduct, OrderConfirmation,
    PaymentOutcome, Platform, Product, User,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkout::{merge_payment_methods, processor_payment_methods, require_non_empty};
use crate::config::PaymentProcessorConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::http::{AuthScheme, PlatformHttp};
use crate::service::{
    AuthService, CatalogService, CheckoutService, CmsService, CrossSellService,
    PlatformLifecycle, ProductService,
};

/// Storefront API version the queries below are written against.
const API_VERSION: &str = "2024-01";

const STOREFRONT_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Page size for catalog queries. Kiosk menus are small; one page suffices.
const PAGE_SIZE: u32 = 50;

// =============================================================================
// GraphQL Envelope
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GqlConnection<T> {
    edges: Vec<GqlEdge<T>>,
}

#[derive(Debug, Deserialize)]
struct GqlEdge<T> {
    node: T,
}

/// Storefront `MoneyV2`: the amount arrives as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyV2 {
    amount: String,
    currency_code: String,
}

impl MoneyV2 {
    fn cents(&self, platform: Platform) -> PlatformResult<i64> {
        let amount: f64 = self.amount.parse().map_err(|_| PlatformError::Decode {
            platform,
            reason: format!("unparseable money amount {:?}", self.amount),
        })?;
        Ok(to_cents(amount))
    }
}

#[derive(Debug, Deserialize)]
struct GqlImage {
    url: String,
}

// =============================================================================
// Query Payload Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ShopData {
    shop: ShopNode,
}

#[derive(Debug, Deserialize)]
struct ShopNode {
    name: String,
    brand: Option<ShopBrand>,
}

#[derive(Debug, Deserialize)]
struct ShopBrand {
    slogan: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionsData {
    collections: GqlConnection<CollectionNode>,
}

#[derive(Debug, Deserialize)]
struct CollectionNode {
    id: String,
    title: String,
    image: Option<GqlImage>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: GqlConnection<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct CollectionProductsData {
    collection: Option<CollectionProducts>,
}

#[derive(Debug, Deserialize)]
struct CollectionProducts {
    products: GqlConnection<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsData {
    #[serde(rename = "productRecommendations")]
    product_recommendations: Option<Vec<ProductNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    description: String,
    featured_image: Option<GqlImage>,
    variants: GqlConnection<VariantNode>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    id: String,
    price: MoneyV2,
    sku: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenCreateData {
    customer_access_token_create: TokenCreatePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenCreatePayload {
    customer_access_token: Option<CustomerAccessToken>,
    customer_user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerAccessToken {
    access_token: String,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct CustomerUserError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    customer: Option<CustomerNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerNode {
    id: String,
    email: Option<String>,
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartCreateData {
    cart_create: CartCreatePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartCreatePayload {
    cart: Option<CartNode>,
    user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
struct CartData {
    cart: Option<CartNode>,
}

#[derive(Debug, Deserialize)]
struct CartNode {
    id: String,
    cost: CartCost,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartCost {
    total_amount: MoneyV2,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartSubmitData {
    cart_submit_for_completion: CartSubmitPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartSubmitPayload {
    result: Option<CartSubmitResult>,
    user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartSubmitResult {
    attempt_id: Option<String>,
}

// =============================================================================
// Adapter
// =============================================================================

/// Shopify Storefront adapter.
pub struct ShopifyAdapter {
    http: PlatformHttp,
    payment_processor: Option<PaymentProcessorConfig>,
    /// Canonical product id → variant GID, learned from catalog calls.
    variant_gids: Mutex<HashMap<String, String>>,
}

impl ShopifyAdapter {
    pub fn new(
        base_url: &str,
        storefront_token: &str,
        payment_processor: Option<PaymentProcessorConfig>,
    ) -> PlatformResult<Self> {
        let http = PlatformHttp::new(
            Platform::Shopify,
            base_url,
            AuthScheme::Header {
                name: STOREFRONT_TOKEN_HEADER,
                value: storefront_token.to_string(),
            },
        )?;
        Ok(ShopifyAdapter {
            http,
            payment_processor,
            variant_gids: Mutex::new(HashMap::new()),
        })
    }

    /// Executes one GraphQL operation against the Storefront endpoint.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> PlatformResult<T> {
        let body = json!({ "query": query, "variables": variables });
        let response: GraphQlResponse<T> = self
            .http
            .post_json(&format!("api/{API_VERSION}/graphql.json"), &body)
            .await?;

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PlatformError::GraphQl {
                platform: Platform::Shopify,
                message,
            });
        }

        response.data.ok_or_else(|| PlatformError::Decode {
            platform: Platform::Shopify,
            reason: "GraphQL response carried neither data nor errors".to_string(),
        })
    }

    fn translate_product(&self, node: ProductNode) -> PlatformResult<ExtendedProduct> {
        let product_id = gid_tail(&node.id);
        let variant = node
            .variants
            .edges
            .first()
            .map(|e| &e.node)
            .ok_or_else(|| PlatformError::Decode {
                platform: Platform::Shopify,
                reason: format!("product {product_id} has no variants"),
            })?;

        self.variant_gids
            .lock()
            .expect("variant gid mutex poisoned")
            .insert(product_id.clone(), variant.id.clone());

        let raw = json!({
            "productGid": node.id,
            "variantGid": variant.id,
        });

        Ok(ExtendedProduct::with_platform_data(
            Product {
                id: product_id,
                name: node.title,
                description: node.description,
                price_cents: variant.price.cents(Platform::Shopify)?,
                currency: variant.price.currency_code.clone(),
                category_id: None,
                image_url: node.featured_image.map(|i| i.url),
                sku: variant.sku.clone(),
            },
            Platform::Shopify,
            raw,
        ))
    }

    fn translate_products(
        &self,
        nodes: GqlConnection<ProductNode>,
    ) -> PlatformResult<Vec<ExtendedProduct>> {
        nodes
            .edges
            .into_iter()
            .map(|e| self.translate_product(e.node))
            .collect()
    }

    /// The variant GID for a canonical product id, fetching the product when
    /// it was never served through this adapter instance.
    async fn variant_gid(&self, product_id: &str) -> PlatformResult<String> {
        let known = self
            .variant_gids
            .lock()
            .expect("variant gid mutex poisoned")
            .get(product_id)
            .cloned();
        if let Some(gid) = known {
            return Ok(gid);
        }

        // Populates the map as a side effect.
        self.product(product_id).await?;
        self.variant_gids
            .lock()
            .expect("variant gid mutex poisoned")
            .get(product_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                platform: Platform::Shopify,
                resource: "product variant",
                id: product_id.to_string(),
            })
    }
}

/// The trailing segment of a Shopify GID, used as the canonical id.
fn gid_tail(gid: &str) -> String {
    gid.rsplit('/').next().unwrap_or(gid).to_string()
}

fn product_gid(product_id: &str) -> String {
    format!("gid://shopify/Product/{product_id}")
}

fn collection_gid(category_id: &str) -> String {
    format!("gid://shopify/Collection/{category_id}")
}

// =============================================================================
// Query Text
// =============================================================================

const PRODUCT_FIELDS: &str = r#"
  id
  title
  description
  featuredImage { url }
  variants(first: 1) {
    edges { node { id sku price { amount currencyCode } } }
  }
"#;

// =============================================================================
// Capability Implementations
// =============================================================================

#[async_trait]
impl AuthService for ShopifyAdapter {
    async fn login(&self, username: &str, password: &str) -> PlatformResult<(AuthToken, User)> {
        let query = r#"
            mutation ($input: CustomerAccessTokenCreateInput!) {
              customerAccessTokenCreate(input: $input) {
                customerAccessToken { accessToken expiresAt }
                customerUserErrors { message }
              }
            }
        "#;
        let data: TokenCreateData = self
            .execute(
                query,
                json!({ "input": { "email": username, "password": password } }),
            )
            .await?;

        let payload = data.customer_access_token_create;
        let token = match payload.customer_access_token {
            Some(t) => t,
            None => {
                let reason = payload
                    .customer_user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(PlatformError::Auth {
                    platform: Platform::Shopify,
                    reason: if reason.is_empty() {
                        "invalid credentials".to_string()
                    } else {
                        reason
                    },
                });
            }
        };

        let customer_query = r#"
            query ($token: String!) {
              customer(customerAccessToken: $token) { id email displayName }
            }
        "#;
        let customer: CustomerData = self
            .execute(customer_query, json!({ "token": token.access_token }))
            .await?;
        let customer = customer.customer.ok_or_else(|| PlatformError::Auth {
            platform: Platform::Shopify,
            reason: "access token did not resolve to a customer".to_string(),
        })?;

        info!(customer_id = %customer.id, "shopify login");
        Ok((
            AuthToken {
                token: token.access_token,
                expires_at: token.expires_at,
            },
            User {
                id: gid_tail(&customer.id),
                username: customer.email.unwrap_or_else(|| username.to_string()),
                display_name: customer.display_name,
                roles: vec!["customer".to_string()],
            },
        ))
    }

    async fn logout(&self) -> PlatformResult<()> {
        // Storefront tokens expire server-side; nothing to revoke here.
        Ok(())
    }
}

#[async_trait]
impl CatalogService for ShopifyAdapter {
    async fn categories(&self) -> PlatformResult<Vec<Category>> {
        let query = format!(
            r#"
            query {{
              collections(first: {PAGE_SIZE}) {{
                edges {{ node {{ id title image {{ url }} }} }}
              }}
            }}
        "#
        );
        let data: CollectionsData = self.execute(&query, json!({})).await?;

        Ok(data
            .collections
            .edges
            .into_iter()
            .map(|e| Category {
                id: gid_tail(&e.node.id),
                name: e.node.title,
                // Shopify collections are flat
                parent_id: None,
                image_url: e.node.image.map(|i| i.url),
            })
            .collect())
    }
}

#[async_trait]
impl ProductService for ShopifyAdapter {
    async fn products(&self, category_id: Option<&str>) -> PlatformResult<Vec<ExtendedProduct>> {
        match category_id {
            Some(category_id) => {
                let query = format!(
                    r#"
                    query ($id: ID!) {{
                      collection(id: $id) {{
                        products(first: {PAGE_SIZE}) {{
                          edges {{ node {{ {PRODUCT_FIELDS} }} }}
                        }}
                      }}
                    }}
                "#
                );
                let data: CollectionProductsData = self
                    .execute(&query, json!({ "id": collection_gid(category_id) }))
                    .await?;
                let collection = data.collection.ok_or_else(|| PlatformError::NotFound {
                    platform: Platform::Shopify,
                    resource: "collection",
                    id: category_id.to_string(),
                })?;
                self.translate_products(collection.products)
            }
            None => {
                let query = format!(
                    r#"
                    query {{
                      products(first: {PAGE_SIZE}) {{
                        edges {{ node {{ {PRODUCT_FIELDS} }} }}
                      }}
                    }}
                "#
                );
                let data: ProductsData = self.execute(&query, json!({})).await?;
                self.translate_products(data.products)
            }
        }
    }

    async fn product(&self, id: &str) -> PlatformResult<ExtendedProduct> {
        let query = format!(
            r#"
            query ($id: ID!) {{
              product(id: $id) {{ {PRODUCT_FIELDS} }}
            }}
        "#
        );
        let data: ProductData = self
            .execute(&query, json!({ "id": product_gid(id) }))
            .await?;
        let node = data.product.ok_or_else(|| PlatformError::NotFound {
            platform: Platform::Shopify,
            resource: "product",
            id: id.to_string(),
        })?;
        self.translate_product(node)
    }
}

#[async_trait]
impl CrossSellService for ShopifyAdapter {
    async fn suggestions(&self, product_ids: &[String]) -> PlatformResult<Vec<ExtendedProduct>> {
        // Shopify recommends per product; seed from the first basket line.
        let Some(seed) = product_ids.first() else {
            return Ok(Vec::new());
        };

        let query = format!(
            r#"
            query ($id: ID!) {{
              productRecommendations(productId: $id) {{ {PRODUCT_FIELDS} }}
            }}
        "#
        );
        let data: RecommendationsData = self
            .execute(&query, json!({ "id": product_gid(seed) }))
            .await?;

        data.product_recommendations
            .unwrap_or_default()
            .into_iter()
            .filter(|n| !product_ids.contains(&gid_tail(&n.id)))
            .map(|n| self.translate_product(n))
            .collect()
    }

    async fn apply_upgrade(&self, _offer_id: &str) -> PlatformResult<ExtendedProduct> {
        Err(PlatformError::Unimplemented {
            platform: Platform::Shopify,
            feature: "upgrade offers",
        })
    }
}

#[async_trait]
impl CmsService for ShopifyAdapter {
    async fn splash(&self) -> PlatformResult<CmsContent> {
        let query = "query { shop { name brand { slogan } } }";
        match self.execute::<ShopData>(query, json!({})).await {
            Ok(data) => Ok(CmsContent {
                title: data.shop.name,
                subtitle: data.shop.brand.and_then(|b| b.slogan),
                image_url: None,
                body: None,
            }),
            Err(e) => {
                warn!(error = %e, "shopify splash fetch failed, using default");
                Ok(CmsContent::default_splash())
            }
        }
    }
}

#[async_trait]
impl CheckoutService for ShopifyAdapter {
    async fn create_checkout(&self, basket: &Basket) -> PlatformResult<String> {
        require_non_empty(Platform::Shopify, basket)?;

        let mut lines = Vec::with_capacity(basket.lines.len());
        for line in &basket.lines {
            let merchandise_id = self.variant_gid(&line.product_id).await?;
            lines.push(json!({
                "merchandiseId": merchandise_id,
                "quantity": line.quantity,
            }));
        }

        let query = r#"
            mutation ($input: CartInput!) {
              cartCreate(input: $input) {
                cart { id cost { totalAmount { amount currencyCode } } }
                userErrors { message }
              }
            }
        "#;
        let data: CartCreateData = self
            .execute(query, json!({ "input": { "lines": lines } }))
            .await?;

        let payload = data.cart_create;
        let cart = payload.cart.ok_or_else(|| PlatformError::Checkout {
            platform: Platform::Shopify,
            reason: payload
                .user_errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        })?;

        debug!(cart_id = %cart.id, "shopify cart created");
        Ok(cart.id)
    }

    async fn checkout_data(&self, checkout_id: &str) -> PlatformResult<CheckoutData> {
        let query = r#"
            query ($id: ID!) {
              cart(id: $id) { id cost { totalAmount { amount currencyCode } } }
            }
        "#;
        let data: CartData = self.execute(query, json!({ "id": checkout_id })).await?;
        let cart = data.cart.ok_or_else(|| PlatformError::NotFound {
            platform: Platform::Shopify,
            resource: "cart",
            id: checkout_id.to_string(),
        })?;

        Ok(CheckoutData {
            id: cart.id,
            // The Storefront API reports no terminal methods; the processor
            // (or the cash fallback) supplies them.
            payment_methods: merge_payment_methods(
                Vec::new(),
                processor_payment_methods(self.payment_processor.as_ref()),
            ),
            total_cents: cart.cost.total_amount.cents(Platform::Shopify)?,
            currency: cart.cost.total_amount.currency_code,
            expires_at: None,
        })
    }

    async fn process_payment(
        &self,
        _checkout_id: &str,
        _method_id: &str,
    ) -> PlatformResult<PaymentOutcome> {
        Err(PlatformError::Unimplemented {
            platform: Platform::Shopify,
            feature: "payment capture via the Storefront API",
        })
    }

    async fn confirm_order(&self, checkout_id: &str) -> PlatformResult<OrderConfirmation> {
        // Submission consumes the cart, so capture its total first.
        let total_cents = self.checkout_data(checkout_id).await?.total_cents;

        let query = r#"
            mutation ($cartId: ID!, $attemptToken: String!) {
              cartSubmitForCompletion(cartId: $cartId, attemptToken: $attemptToken) {
                result { ... on SubmitSuccess { attemptId } }
                userErrors { message }
              }
            }
        "#;
        let data: CartSubmitData = self
            .execute(
                query,
                json!({ "cartId": checkout_id, "attemptToken": Uuid::new_v4().to_string() }),
            )
            .await?;

        let payload = data.cart_submit_for_completion;
        if !payload.user_errors.is_empty() {
            return Err(PlatformError::Checkout {
                platform: Platform::Shopify,
                reason: payload
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }

        let attempt_id = payload
            .result
            .and_then(|r| r.attempt_id)
            .unwrap_or_else(|| checkout_id.to_string());

        info!(attempt_id = %attempt_id, "shopify cart submitted");
        Ok(OrderConfirmation {
            order_id: attempt_id.clone(),
            status: "submitted".to_string(),
            total_cents,
            platform: Platform::Shopify,
            raw: json!({ "cartId": checkout_id, "attemptId": attempt_id }),
        })
    }
}

#[async_trait]
impl PlatformLifecycle for ShopifyAdapter {
    fn platform(&self) -> Platform {
        Platform::Shopify
    }

    async fn initialize(&self) -> PlatformResult<()> {
        let data: ShopData = self.execute("query { shop { name } }", json!({})).await?;
        info!(shop = %data.shop.name, "shopify platform ready");
        Ok(())
    }

    async fn dispose(&self) -> PlatformResult<()> {
        self.variant_gids
            .lock()
            .expect("variant gid mutex poisoned")
            .clear();
        info!("shopify platform disposed");
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
    fn test_gid_tail() {
        assert_eq!(gid_tail("gid://shopify/Product/123456"), "123456");
        assert_eq!(gid_tail("plain-id"), "plain-id");
    }

    #[test]
    fn test_gid_reconstruction() {
        assert_eq!(product_gid("42"), "gid://shopify/Product/42");
        assert_eq!(collection_gid("7"), "gid://shopify/Collection/7");
    }

    #[test]
    fn test_money_v2_string_amount_to_cents() {
        let money = MoneyV2 {
            amount: "12.95".to_string(),
            currency_code: "GBP".to_string(),
        };
        assert_eq!(money.cents(Platform::Shopify).unwrap(), 1295);

        let bad = MoneyV2 {
            amount: "not-a-number".to_string(),
            currency_code: "GBP".to_string(),
        };
        assert!(matches!(
            bad.cents(Platform::Shopify),
            Err(PlatformError::Decode { .. })
        ));
    }

    #[test]
    fn test_graphql_error_envelope_decodes() {
        let body = r#"{"data": null, "errors": [{"message": "Throttled"}]}"#;
        let parsed: GraphQlResponse<ShopData> = serde_json::from_str(body).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors.unwrap()[0].message, "Throttled");
    }

    #[test]
    fn test_product_node_decodes_camel_case() {
        let body = r#"{
            "id": "gid://shopify/Product/1",
            "title": "Latte",
            "description": "Hot",
            "featuredImage": {"url": "https://cdn/img.png"},
            "variants": {"edges": [{"node": {
                "id": "gid://shopify/ProductVariant/11",
                "sku": "LATTE",
                "price": {"amount": "3.50", "currencyCode": "GBP"}
            }}]}
        }"#;
        let node: ProductNode = serde_json::from_str(body).unwrap();
        assert_eq!(node.variants.edges[0].node.id, "gid://shopify/ProductVariant/11");
        assert_eq!(node.featured_image.unwrap().url, "https://cdn/img.png");
    }

    #[test]
    fn test_adapter_rejects_nothing_at_construction() {
        // Construction is offline; connectivity is initialize()'s job.
        let adapter = ShopifyAdapter::new("https://shop.myshopify.com", "token", None);
        assert!(adapter.is_ok());
    }
}
