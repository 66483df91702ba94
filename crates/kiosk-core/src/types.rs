//! # Canonical Domain Types
//!
//! The platform-neutral data model every adapter translates into.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Canonical Data Model                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    Product      │   │ ExtendedProduct │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  category_id    │   │  product        │       │
//! │  │  parent_id      │   │  price_cents    │   │  platform_data  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CheckoutData  │   │ PaymentMethod   │   │    TaxRate      │       │
//! │  │  ─────────────  │   │     Info        │   │  ─────────────  │       │
//! │  │  id             │   │  ─────────────  │   │  bps (u32)      │       │
//! │  │  total_cents    │   │  id, label      │   │  2000 = 20%     │       │
//! │  │  payment_methods│   │  processor      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## platform_data Round-Tripping
//! `ExtendedProduct.platform_data` keeps the *untouched* platform record
//! keyed by [`Platform`]. When checkout needs platform-native identifiers
//! (a Shopify variant GID, a WooCommerce product id), the adapter reads them
//! back from here instead of trying to re-derive them from canonical fields.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Platform Tag
// =============================================================================

/// The commerce platforms the kiosk can run against.
///
/// A closed, exhaustively matched set: the service factory matches on this
/// tag and the compiler guarantees no platform is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Built-in demo store, no network.
    InMemory,
    /// Shopify Storefront GraphQL API.
    Shopify,
    /// WooCommerce REST API (wp-json/wc/v3).
    WooCommerce,
    /// Magento REST API (rest/V1).
    Magento,
}

impl Platform {
    /// All supported platforms, in factory display order.
    pub const ALL: [Platform; 4] = [
        Platform::InMemory,
        Platform::Shopify,
        Platform::WooCommerce,
        Platform::Magento,
    ];

    /// Stable lowercase tag used in configs and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::InMemory => "inmemory",
            Platform::Shopify => "shopify",
            Platform::WooCommerce => "woocommerce",
            Platform::Magento => "magento",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (UK VAT). Integer bps keep tax math in integer space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a fraction (0.2 = 20%).
    ///
    /// This is the shape platform configs carry rates in.
    pub fn from_fraction(fraction: f64) -> Self {
        TaxRate((fraction * 10000.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (for display only).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10000.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product category.
///
/// `parent_id` forms an optional tree; top-level categories have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Canonical category id (platform-native id, normalized to a string).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent category id, if nested.
    pub parent_id: Option<String>,
    /// Category tile image.
    pub image_url: Option<String>,
}

/// A sellable product in the canonical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Canonical product id (platform-native id, normalized to a string).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Plain-text description.
    pub description: String,
    /// Price in cents (smallest currency unit).
    pub price_cents: i64,
    /// ISO 4217 currency code the price is denominated in.
    pub currency: String,
    /// Foreign key into [`Category`].
    pub category_id: Option<String>,
    /// Product tile image.
    pub image_url: Option<String>,
    /// Stock keeping unit, when the platform provides one.
    pub sku: Option<String>,
}

/// A product plus the untouched platform records it was translated from.
///
/// The canonical extraction is lossy on purpose (a kiosk tile needs a name,
/// a price and an image). Checkout is not: pushing a line to a platform
/// order API needs platform-native identifiers, which live here verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedProduct {
    /// The canonical product.
    pub product: Product,
    /// Raw platform record keyed by the platform that produced it.
    #[ts(type = "Record<string, unknown>")]
    pub platform_data: HashMap<Platform, serde_json::Value>,
}

impl ExtendedProduct {
    /// Wraps a canonical product with one platform's raw record.
    pub fn with_platform_data(product: Product, platform: Platform, raw: serde_json::Value) -> Self {
        let mut platform_data = HashMap::new();
        platform_data.insert(platform, raw);
        ExtendedProduct { product, platform_data }
    }

    /// A product with no platform record (in-memory demo store).
    pub fn plain(product: Product) -> Self {
        ExtendedProduct {
            product,
            platform_data: HashMap::new(),
        }
    }
}

/// One selected option on a basket line (size, milk, extras...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VariantItem {
    /// Option group name ("Size").
    pub name: String,
    /// Chosen value ("Large").
    pub value: String,
    /// Price adjustment in cents this choice contributed (may be zero).
    pub price_delta_cents: i64,
}

// =============================================================================
// Auth Types
// =============================================================================

/// A platform session token in the canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Opaque token value.
    pub token: String,
    /// Expiry, when the platform reports one.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// An authenticated operator/user in the canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Canonical user id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Name shown in the kiosk header.
    pub display_name: String,
    /// Role tags ("admin", "operator").
    pub roles: Vec<String>,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// One selectable payment method on the payment screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInfo {
    /// Stable method id ("cash", "stripe_card", ...).
    pub id: String,
    /// Customer-facing label.
    pub label: String,
    /// Processor tag this method routes through ("cash", "stripe", ...).
    pub processor: String,
}

impl PaymentMethodInfo {
    /// The universal fallback: pay at the counter.
    ///
    /// Returned whenever no payment processor is configured so the payment
    /// screen is never rendered with zero options.
    pub fn cash() -> Self {
        PaymentMethodInfo {
            id: "cash".to_string(),
            label: "Pay at counter".to_string(),
            processor: "cash".to_string(),
        }
    }
}

/// The normalized checkout result, identical across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    /// The draft order / checkout id the platform issued.
    pub id: String,
    /// Ordered, never-empty list of payment methods.
    pub payment_methods: Vec<PaymentMethodInfo>,
    /// Confirmed total in cents.
    pub total_cents: i64,
    /// ISO 4217 currency of the total.
    pub currency: String,
    /// When the draft expires platform-side, if reported.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Loosely-normalized payment result.
///
/// Only `id`/`status`/`total_cents` are canonical; the raw platform payload
/// rides along tagged by [`Platform`] for callers that need more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    /// Platform payment/transaction id.
    pub id: String,
    /// Platform-reported status ("paid", "pending", ...).
    pub status: String,
    /// Amount captured, in cents.
    pub total_cents: i64,
    /// Which platform produced [`Self::raw`].
    pub platform: Platform,
    /// Untouched platform response.
    #[ts(type = "unknown")]
    pub raw: serde_json::Value,
}

/// Loosely-normalized order confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// Platform order id / number.
    pub order_id: String,
    /// Platform-reported status.
    pub status: String,
    /// Final order total, in cents.
    pub total_cents: i64,
    /// Which platform produced [`Self::raw`].
    pub platform: Platform,
    /// Untouched platform response.
    #[ts(type = "unknown")]
    pub raw: serde_json::Value,
}

// =============================================================================
// CMS Types
// =============================================================================

/// Splash-screen content fetched from the platform CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CmsContent {
    /// Headline.
    pub title: String,
    /// Secondary line.
    pub subtitle: Option<String>,
    /// Hero image.
    pub image_url: Option<String>,
    /// Free-form body text.
    pub body: Option<String>,
}

impl CmsContent {
    /// Hardcoded splash content used when the CMS fetch fails.
    ///
    /// CMS reads are non-critical: the kiosk degrades to this rather than
    /// blocking the attract screen.
    pub fn default_splash() -> Self {
        CmsContent {
            title: "Welcome".to_string(),
            subtitle: Some("Tap anywhere to start your order".to_string()),
            image_url: None,
            body: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_fraction() {
        assert_eq!(TaxRate::from_fraction(0.2).bps(), 2000);
        assert_eq!(TaxRate::from_fraction(0.0825).bps(), 825);
        assert!((TaxRate::from_bps(2000).fraction() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_platform_tags() {
        assert_eq!(Platform::Shopify.as_str(), "shopify");
        assert_eq!(Platform::ALL.len(), 4);
        // serde uses the same lowercase tags
        assert_eq!(
            serde_json::to_string(&Platform::WooCommerce).unwrap(),
            "\"woocommerce\""
        );
    }

    #[test]
    fn test_extended_product_keeps_raw_record() {
        let product = Product {
            id: "123".to_string(),
            name: "Latte".to_string(),
            description: String::new(),
            price_cents: 350,
            currency: "GBP".to_string(),
            category_id: None,
            image_url: None,
            sku: None,
        };
        let raw = serde_json::json!({ "id": "gid://shopify/Product/123" });
        let extended = ExtendedProduct::with_platform_data(product, Platform::Shopify, raw.clone());
        assert_eq!(extended.platform_data.get(&Platform::Shopify), Some(&raw));
    }

    #[test]
    fn test_cash_fallback_method() {
        let cash = PaymentMethodInfo::cash();
        assert_eq!(cash.id, "cash");
        assert_eq!(cash.processor, "cash");
    }
}
