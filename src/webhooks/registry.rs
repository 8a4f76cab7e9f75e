//! Topic-to-handler registry and webhook dispatch.
//!
//! The registry is filled once at start-up and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storefront_gateway::webhooks::{HandlerRegistry, PrivacyHandler, WebhookTopic};
//!
//! let mut registry = HandlerRegistry::new();
//! registry.add_handler(WebhookTopic::ShopRedact, Arc::new(PrivacyHandler));
//!
//! assert_eq!(registry.handler_count(WebhookTopic::ShopRedact), 1);
//! assert_eq!(registry.handler_count(WebhookTopic::OrdersCreate), 0);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionStore;
use crate::config::ShopifyConfig;

use super::errors::WebhookError;
use super::handlers::{AppUninstalledHandler, PrivacyHandler};
use super::types::{WebhookHandler, WebhookTopic};
use super::verification::{verify_webhook, WebhookContext, WebhookRequest};

/// Result of dispatching a verified delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every registered handler ran successfully.
    Handled {
        /// Number of handlers invoked.
        handlers: usize,
    },
    /// No handler is registered for the topic; nothing ran.
    Unhandled,
}

/// Maps topics to ordered lists of handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<WebhookTopic, Vec<Arc<dyn WebhookHandler>>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(topic, list)| (topic.as_str(), list.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in handlers: [`PrivacyHandler`] for
    /// the three privacy-compliance topics and [`AppUninstalledHandler`] for
    /// `app/uninstalled`.
    #[must_use]
    pub fn with_builtin_handlers(store: Arc<dyn SessionStore>) -> Self {
        let mut registry = Self::new();
        let privacy: Arc<dyn WebhookHandler> = Arc::new(PrivacyHandler);
        for topic in WebhookTopic::PRIVACY_COMPLIANCE {
            registry.add_handler(topic, Arc::clone(&privacy));
        }
        registry.add_handler(
            WebhookTopic::AppUninstalled,
            Arc::new(AppUninstalledHandler::new(store)),
        );
        registry
    }

    /// Appends `handler` to the list for `topic`.
    ///
    /// Handlers for one topic run in the order they were added.
    pub fn add_handler(
        &mut self,
        topic: WebhookTopic,
        handler: Arc<dyn WebhookHandler>,
    ) -> &mut Self {
        self.handlers.entry(topic).or_default().push(handler);
        self
    }

    /// Number of handlers registered for `topic`.
    #[must_use]
    pub fn handler_count(&self, topic: WebhookTopic) -> usize {
        self.handlers.get(&topic).map_or(0, Vec::len)
    }

    /// Topics with at least one handler.
    #[must_use]
    pub fn topics(&self) -> Vec<WebhookTopic> {
        self.handlers
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(topic, _)| *topic)
            .collect()
    }

    /// Runs the handlers registered for a verified delivery.
    ///
    /// The body is parsed only when at least one handler exists. Handlers run
    /// sequentially; the first failure stops the chain.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::PayloadParseError`] if the body is not JSON
    /// - [`WebhookError::HandlerFailed`] with the index of the failing handler
    pub async fn dispatch(
        &self,
        context: &WebhookContext,
        body: &[u8],
    ) -> Result<DispatchOutcome, WebhookError> {
        let handlers = match context.topic().and_then(|t| self.handlers.get(&t)) {
            Some(list) if !list.is_empty() => list,
            _ => return Ok(DispatchOutcome::Unhandled),
        };

        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| WebhookError::PayloadParseError {
                message: format!("{:?} at line {} column {}", e.classify(), e.line(), e.column()),
            })?;

        for (index, handler) in handlers.iter().enumerate() {
            handler
                .handle(context, &payload)
                .await
                .map_err(|source| WebhookError::HandlerFailed {
                    topic: context.topic_raw().to_string(),
                    index,
                    source,
                })?;
        }

        Ok(DispatchOutcome::Handled {
            handlers: handlers.len(),
        })
    }

    /// Verifies `request` and dispatches it, bounding dispatch by `timeout`.
    ///
    /// # Errors
    ///
    /// Any error of [`verify_webhook`] or [`dispatch`](Self::dispatch), or
    /// [`WebhookError::Timeout`] when the handlers do not finish in time.
    pub async fn process(
        &self,
        config: &ShopifyConfig,
        request: &WebhookRequest,
        timeout: Duration,
    ) -> Result<DispatchOutcome, WebhookError> {
        let context = verify_webhook(config, request)?;

        let outcome = tokio::time::timeout(timeout, self.dispatch(&context, request.body()))
            .await
            .map_err(|_| WebhookError::Timeout {
                topic: context.topic_raw().to_string(),
                elapsed: timeout,
            })??;

        tracing::info!(
            topic = context.topic_raw(),
            shop = %context.shop(),
            webhook_id = context.webhook_id().unwrap_or("-"),
            outcome = ?outcome,
            "webhook processed"
        );
        Ok(outcome)
    }
}

// Verify HandlerRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HandlerRegistry>();
};
