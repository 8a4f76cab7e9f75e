//! Webhook signature verification.
//!
//! The signature is an HMAC-SHA256 of the raw body bytes, base64-encoded in
//! `X-Shopify-Hmac-SHA256`. It is checked before anything else about the
//! delivery is trusted; only then are the topic and shop headers read.
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::auth::oauth::hmac::compute_signature_base64;
//! use storefront_gateway::webhooks::{verify_webhook, WebhookRequest, WebhookTopic};
//! use storefront_gateway::{ApiKey, ApiSecretKey, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":1}"#.to_vec();
//! let request = WebhookRequest::new(
//!     body.clone(),
//!     compute_signature_base64(&body, "secret"),
//!     Some("orders/create".to_string()),
//!     Some("my-store.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic(), Some(WebhookTopic::OrdersCreate));
//! ```

use crate::auth::oauth::hmac::verify_base64_signature;
use crate::config::{ShopDomain, ShopifyConfig};
use crate::webhooks::{WebhookError, WebhookTopic};

/// HMAC signature header.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";
/// Topic header, e.g. `orders/create`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";
/// Originating shop header.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";
/// API version the payload was rendered with.
pub const HEADER_API_VERSION: &str = "X-Shopify-API-Version";
/// Delivery id, stable across retries.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// A raw webhook delivery: body bytes plus the relevant headers.
#[derive(Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a request from the body and header values.
    #[must_use]
    pub const fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
            api_version,
            webhook_id,
        }
    }

    /// The unparsed body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The signature header value (empty when absent).
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }

    /// The topic header value.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The shop header value.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }
}

impl std::fmt::Debug for WebhookRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRequest")
            .field("body_len", &self.body.len())
            .field("topic", &self.topic)
            .field("shop_domain", &self.shop_domain)
            .field("webhook_id", &self.webhook_id)
            .finish_non_exhaustive()
    }
}

/// Metadata of a verified delivery, handed to every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: Option<WebhookTopic>,
    topic_raw: String,
    shop: ShopDomain,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Creates a context directly, for handler tests.
    #[must_use]
    pub fn new(
        topic_raw: impl Into<String>,
        shop: ShopDomain,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        let topic_raw = topic_raw.into();
        Self {
            topic: topic_raw.parse().ok(),
            topic_raw,
            shop,
            api_version,
            webhook_id,
        }
    }

    /// The parsed topic, or `None` for topics this build does not know.
    #[must_use]
    pub const fn topic(&self) -> Option<WebhookTopic> {
        self.topic
    }

    /// The topic exactly as sent.
    #[must_use]
    pub fn topic_raw(&self) -> &str {
        &self.topic_raw
    }

    /// The originating shop.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// The payload's API version, if sent.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// The delivery id, if sent.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Verifies the signature of `request` and extracts its context.
///
/// # Errors
///
/// - [`WebhookError::InvalidHmac`] if the signature header is missing or
///   does not match the body under the primary or old secret
/// - [`WebhookError::MissingHeader`] if the topic or shop header is absent
/// - [`WebhookError::InvalidShopDomain`] if the shop header is malformed
pub fn verify_webhook(
    config: &ShopifyConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    if !verify_base64_signature(request.body(), request.hmac_header(), config) {
        return Err(WebhookError::InvalidHmac);
    }

    let topic_raw = non_empty(request.topic()).ok_or(WebhookError::MissingHeader {
        header: HEADER_TOPIC,
    })?;
    let shop_raw = non_empty(request.shop_domain()).ok_or(WebhookError::MissingHeader {
        header: HEADER_SHOP_DOMAIN,
    })?;
    let shop = ShopDomain::new(shop_raw).map_err(|_| WebhookError::InvalidShopDomain {
        domain: shop_raw.to_string(),
    })?;

    Ok(WebhookContext::new(
        topic_raw,
        shop,
        request.api_version.clone(),
        request.webhook_id.clone(),
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
