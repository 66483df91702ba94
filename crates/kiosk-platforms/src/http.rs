//! # Shared Platform HTTP Client
//!
//! One thin wrapper over `reqwest` used by every remote adapter.
//!
//! ## Error Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    HTTP Error Mapping                                   │
//! │                                                                         │
//! │  transport failure (DNS/connect/timeout) ──► PlatformError::Network     │
//! │  non-2xx status ───────────────────────────► PlatformError::Http        │
//! │  2xx but body fails to decode ─────────────► PlatformError::Decode      │
//! │                                                                         │
//! │  Every error carries the platform tag. Raw reqwest errors never cross   │
//! │  the adapter boundary unwrapped.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request carries `Content-Type: application/json` and the platform's
//! auth header, and runs under a per-call timeout.

use std::time::Duration;

use base64::Engine;
use kiosk_core::types::Platform;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{PlatformError, PlatformResult};

/// Default per-call timeout. None of the storefront APIs should take longer
/// than this on a healthy network, and a kiosk must not hang on a dead one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Auth Schemes
// =============================================================================

/// How a platform authenticates its API calls.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>` (Magento admin token).
    Bearer(String),
    /// `Authorization: Basic base64(key:secret)` (WooCommerce).
    Basic { key: String, secret: String },
    /// A custom header (Shopify storefront token).
    Header { name: &'static str, value: String },
}

/// Encodes a Basic auth header value from a key/secret pair.
pub fn basic_auth_value(key: &str, secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:{secret}"));
    format!("Basic {encoded}")
}

// =============================================================================
// Platform HTTP Client
// =============================================================================

/// A reqwest client bound to one platform's base URL and auth scheme.
#[derive(Debug, Clone)]
pub struct PlatformHttp {
    platform: Platform,
    client: reqwest::Client,
    base_url: String,
    auth: AuthScheme,
}

impl PlatformHttp {
    /// Builds a client. The base URL must already have passed config
    /// validation; trailing slashes are normalized away.
    pub fn new(platform: Platform, base_url: &str, auth: AuthScheme) -> PlatformResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::Config {
                platform,
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(PlatformHttp {
            platform,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// The platform this client talks to.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn apply_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            AuthScheme::Bearer(token) => builder.bearer_auth(token),
            AuthScheme::Basic { key, secret } => {
                builder.header(reqwest::header::AUTHORIZATION, basic_auth_value(key, secret))
            }
            AuthScheme::Header { name, value } => builder.header(*name, value),
        }
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let url = self.url(path);
        debug!(platform = %self.platform, %url, "GET");

        let response = self
            .apply_auth(self.client.get(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| PlatformError::Network {
                platform: self.platform,
                source,
            })?;

        self.decode(response).await
    }

    /// POST a JSON body, decoding a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PlatformResult<T> {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    /// PUT a JSON body, decoding a JSON response.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PlatformResult<T> {
        self.send_json(reqwest::Method::PUT, path, body).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> PlatformResult<T> {
        let url = self.url(path);
        debug!(platform = %self.platform, %url, method = %method, "request");

        let response = self
            .apply_auth(self.client.request(method, &url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| PlatformError::Network {
                platform: self.platform,
                source,
            })?;

        self.decode(response).await
    }

    /// Maps status + body into the domain error taxonomy.
    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> PlatformResult<T> {
        let status = response.status();

        if !status.is_success() {
            // Keep a bounded slice of the body for diagnostics; platforms
            // return HTML error pages that would otherwise flood the logs.
            let body = response.text().await.unwrap_or_default();
            let reason: String = body.chars().take(200).collect();
            return Err(PlatformError::Http {
                platform: self.platform,
                status: status.as_u16(),
                reason,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode {
                platform: self.platform,
                reason: e.to_string(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_value() {
        // base64("ck_key:cs_secret")
        assert_eq!(
            basic_auth_value("ck_key", "cs_secret"),
            "Basic Y2tfa2V5OmNzX3NlY3JldA=="
        );
    }

    #[test]
    fn test_url_joining_normalizes_slashes() {
        let http = PlatformHttp::new(
            Platform::WooCommerce,
            "https://shop.example.com/",
            AuthScheme::Basic {
                key: "k".to_string(),
                secret: "s".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            http.url("/wp-json/wc/v3/products"),
            "https://shop.example.com/wp-json/wc/v3/products"
        );
        assert_eq!(
            http.url("wp-json/wc/v3/products"),
            "https://shop.example.com/wp-json/wc/v3/products"
        );
    }
}
