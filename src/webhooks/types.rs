//! Webhook topics and the handler interface.

use super::errors::HandlerError;
use super::verification::WebhookContext;
use crate::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A webhook topic the gateway knows how to route.
///
/// Topics arrive as strings in `X-Shopify-Topic`; strings outside this enum
/// verify normally but never match a handler.
///
/// ```rust
/// use storefront_gateway::webhooks::WebhookTopic;
///
/// let topic: WebhookTopic = "customers/redact".parse().unwrap();
/// assert_eq!(topic, WebhookTopic::CustomersRedact);
/// assert_eq!(topic.to_string(), "customers/redact");
/// assert!(topic.is_privacy_compliance());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    /// The app was uninstalled from the shop.
    #[serde(rename = "app/uninstalled")]
    AppUninstalled,
    /// A customer asked the shop for their stored data.
    #[serde(rename = "customers/data_request")]
    CustomersDataRequest,
    /// A shop asked for a customer's data to be erased.
    #[serde(rename = "customers/redact")]
    CustomersRedact,
    /// A shop's data must be erased (sent 48 hours after uninstall).
    #[serde(rename = "shop/redact")]
    ShopRedact,
    /// Shop settings changed.
    #[serde(rename = "shop/update")]
    ShopUpdate,
    /// An order was created.
    #[serde(rename = "orders/create")]
    OrdersCreate,
    /// An order was updated.
    #[serde(rename = "orders/updated")]
    OrdersUpdated,
    /// An order was paid.
    #[serde(rename = "orders/paid")]
    OrdersPaid,
    /// An order was cancelled.
    #[serde(rename = "orders/cancelled")]
    OrdersCancelled,
    /// A product was created.
    #[serde(rename = "products/create")]
    ProductsCreate,
    /// A product was updated.
    #[serde(rename = "products/update")]
    ProductsUpdate,
    /// A product was deleted.
    #[serde(rename = "products/delete")]
    ProductsDelete,
    /// A customer was created.
    #[serde(rename = "customers/create")]
    CustomersCreate,
    /// A customer was updated.
    #[serde(rename = "customers/update")]
    CustomersUpdate,
}

impl WebhookTopic {
    /// The three mandatory privacy-compliance topics.
    pub const PRIVACY_COMPLIANCE: [Self; 3] = [
        Self::CustomersDataRequest,
        Self::CustomersRedact,
        Self::ShopRedact,
    ];

    /// Returns `true` for the mandatory privacy-compliance topics.
    #[must_use]
    pub fn is_privacy_compliance(self) -> bool {
        Self::PRIVACY_COMPLIANCE.contains(&self)
    }

    /// The wire form, e.g. `orders/create`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AppUninstalled => "app/uninstalled",
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
            Self::ShopUpdate => "shop/update",
            Self::OrdersCreate => "orders/create",
            Self::OrdersUpdated => "orders/updated",
            Self::OrdersPaid => "orders/paid",
            Self::OrdersCancelled => "orders/cancelled",
            Self::ProductsCreate => "products/create",
            Self::ProductsUpdate => "products/update",
            Self::ProductsDelete => "products/delete",
            Self::CustomersCreate => "customers/create",
            Self::CustomersUpdate => "customers/update",
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for topic strings outside [`WebhookTopic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown webhook topic '{0}'")]
pub struct UnknownTopic(pub String);

impl FromStr for WebhookTopic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The serde renames are the single source of the wire names.
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| UnknownTopic(s.to_string()))
    }
}

/// Processes one verified webhook delivery.
///
/// Deliveries are at-least-once: the platform retries whenever the gateway
/// answers 500, so implementations must be idempotent.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::webhooks::{HandlerError, WebhookContext, WebhookHandler};
/// use storefront_gateway::BoxFuture;
///
/// struct LogOrder;
///
/// impl WebhookHandler for LogOrder {
///     fn handle<'a>(
///         &'a self,
///         context: &'a WebhookContext,
///         payload: &'a serde_json::Value,
///     ) -> BoxFuture<'a, Result<(), HandlerError>> {
///         Box::pin(async move {
///             tracing::info!(shop = %context.shop(), id = ?payload.get("id"), "order received");
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait WebhookHandler: Send + Sync {
    /// Handles the parsed payload of a delivery described by `context`.
    fn handle<'a>(
        &'a self,
        context: &'a WebhookContext,
        payload: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_round_trips_through_wire_form() {
        for topic in [
            WebhookTopic::AppUninstalled,
            WebhookTopic::CustomersDataRequest,
            WebhookTopic::OrdersCreate,
            WebhookTopic::ProductsDelete,
        ] {
            assert_eq!(topic.as_str().parse::<WebhookTopic>().unwrap(), topic);
            assert_eq!(
                serde_json::to_string(&topic).unwrap(),
                format!("\"{}\"", topic.as_str())
            );
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "APP/UNINSTALLED".parse::<WebhookTopic>().unwrap(),
            WebhookTopic::AppUninstalled
        );
    }

    #[test]
    fn test_unknown_topic_is_an_error() {
        let err = "carts/create".parse::<WebhookTopic>().unwrap_err();
        assert_eq!(err, UnknownTopic("carts/create".to_string()));
    }

    #[test]
    fn test_privacy_compliance_topics() {
        assert!(WebhookTopic::ShopRedact.is_privacy_compliance());
        assert!(!WebhookTopic::AppUninstalled.is_privacy_compliance());
    }
}
