//! Shared application state.

use std::sync::Arc;

use crate::auth::SessionStore;
use crate::clients::{AdminClient, PassthroughClient, ProductService};
use crate::config::AppConfig;
use crate::webhooks::HandlerRegistry;

/// Everything a route needs, built once at start-up.
///
/// Cloning is cheap: every field is shared.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    sessions: Arc<dyn SessionStore>,
    webhooks: Arc<HandlerRegistry>,
    products: Arc<dyn ProductService>,
    passthrough: PassthroughClient,
    http: reqwest::Client,
}

impl AppState {
    /// Builds the state with the built-in webhook handlers and an
    /// [`AdminClient`] as the product service.
    #[must_use]
    pub fn new(config: AppConfig, sessions: Arc<dyn SessionStore>, http: reqwest::Client) -> Self {
        let webhooks = HandlerRegistry::with_builtin_handlers(Arc::clone(&sessions));
        let products = AdminClient::new(http.clone(), config.shopify().clone());
        let passthrough = PassthroughClient::new(http.clone(), config.passthrough().clone());
        Self {
            config: Arc::new(config),
            sessions,
            webhooks: Arc::new(webhooks),
            products: Arc::new(products),
            passthrough,
            http,
        }
    }

    /// Replaces the webhook registry.
    #[must_use]
    pub fn with_webhooks(mut self, registry: HandlerRegistry) -> Self {
        self.webhooks = Arc::new(registry);
        self
    }

    /// Replaces the product service.
    #[must_use]
    pub fn with_products(mut self, products: Arc<dyn ProductService>) -> Self {
        self.products = products;
        self
    }

    /// The application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The session store.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// The webhook registry.
    #[must_use]
    pub fn webhooks(&self) -> &HandlerRegistry {
        &self.webhooks
    }

    /// The product service.
    #[must_use]
    pub fn products(&self) -> &dyn ProductService {
        self.products.as_ref()
    }

    /// The passthrough client.
    #[must_use]
    pub const fn passthrough(&self) -> &PassthroughClient {
        &self.passthrough
    }

    /// The shared outbound HTTP client.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("webhooks", &self.webhooks)
            .finish_non_exhaustive()
    }
}

// Verify AppState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
};
