//! Webhook pipeline errors.
//!
//! [`WebhookError`] covers every way a delivery can fail between the raw
//! request and the last handler. The gateway maps variants to status codes:
//! signature failures to 401, malformed deliveries to 400, handler failures
//! and timeouts to 500 so the platform redelivers.

use crate::auth::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Error returned by a [`WebhookHandler`](crate::webhooks::WebhookHandler).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler could not complete its work.
    #[error("Handler failed: {message}")]
    Failed {
        /// What went wrong.
        message: String,
    },

    /// The session store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from verifying and dispatching a webhook delivery.
///
/// None of the messages include the request body.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `X-Shopify-Hmac-SHA256` header was missing or did not match the body.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// A required delivery header was absent after the signature verified.
    #[error("Webhook is missing the '{header}' header")]
    MissingHeader {
        /// Header name.
        header: &'static str,
    },

    /// The shop header did not name a valid shop domain.
    #[error("Webhook shop domain '{domain}' is invalid")]
    InvalidShopDomain {
        /// The rejected value.
        domain: String,
    },

    /// The body of a delivery with registered handlers was not valid JSON.
    #[error("Webhook payload is not valid JSON: {message}")]
    PayloadParseError {
        /// Parser message (position and category only).
        message: String,
    },

    /// A registered handler failed; remaining handlers were skipped.
    #[error("Webhook handler {index} for topic '{topic}' failed: {source}")]
    HandlerFailed {
        /// Raw topic string.
        topic: String,
        /// Zero-based position of the failing handler.
        index: usize,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },

    /// Dispatch did not finish within the configured bound.
    #[error("Webhook dispatch for topic '{topic}' timed out after {elapsed:?}")]
    Timeout {
        /// Raw topic string.
        topic: String,
        /// The configured bound.
        elapsed: Duration,
    },
}

impl WebhookError {
    /// `true` for failures the platform should redeliver.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::HandlerFailed { .. } | Self::Timeout { .. })
    }
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
