//! Inbound webhook verification and dispatch.
//!
//! A delivery flows through three steps:
//!
//! 1. [`verify_webhook`] checks the HMAC of the raw body, then reads the
//!    topic and shop headers into a [`WebhookContext`].
//! 2. [`HandlerRegistry::dispatch`] parses the body and runs the handlers
//!    registered for the topic, in order.
//! 3. The gateway maps the [`DispatchOutcome`] or [`WebhookError`] to an
//!    HTTP status; failures answer 500 so the platform redelivers.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storefront_gateway::auth::MemorySessionStore;
//! use storefront_gateway::webhooks::{HandlerRegistry, WebhookTopic};
//!
//! let registry = HandlerRegistry::with_builtin_handlers(Arc::new(MemorySessionStore::new()));
//! assert_eq!(registry.handler_count(WebhookTopic::AppUninstalled), 1);
//! ```

mod errors;
mod handlers;
mod registry;
mod types;
mod verification;

pub use errors::{HandlerError, WebhookError};
pub use handlers::{AppUninstalledHandler, PrivacyHandler};
pub use registry::{DispatchOutcome, HandlerRegistry};
pub use types::{UnknownTopic, WebhookHandler, WebhookTopic};
pub use verification::{
    verify_webhook, WebhookContext, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC,
    HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
