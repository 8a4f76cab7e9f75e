//! Built-in webhook handlers.

use std::sync::Arc;

use crate::auth::SessionStore;
use crate::BoxFuture;

use super::errors::HandlerError;
use super::types::WebhookHandler;
use super::verification::WebhookContext;

/// Acknowledges the mandatory privacy-compliance topics.
///
/// The gateway keeps no customer data of its own, so acknowledging is the
/// whole job. Only the shop, topic and delivery id are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivacyHandler;

impl WebhookHandler for PrivacyHandler {
    fn handle<'a>(
        &'a self,
        context: &'a WebhookContext,
        _payload: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            tracing::info!(
                shop = %context.shop(),
                topic = context.topic_raw(),
                webhook_id = context.webhook_id().unwrap_or("-"),
                "privacy compliance request acknowledged"
            );
            Ok(())
        })
    }
}

/// Deletes every stored session of a shop once the app is uninstalled.
///
/// Safe to run twice: a second delivery finds nothing to delete.
pub struct AppUninstalledHandler {
    store: Arc<dyn SessionStore>,
}

impl AppUninstalledHandler {
    /// Creates a handler that cleans up `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for AppUninstalledHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppUninstalledHandler").finish_non_exhaustive()
    }
}

impl WebhookHandler for AppUninstalledHandler {
    fn handle<'a>(
        &'a self,
        context: &'a WebhookContext,
        _payload: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let ids: Vec<String> = self
                .store
                .find_sessions_by_shop(context.shop())
                .await?
                .into_iter()
                .map(|session| session.id)
                .collect();

            if !ids.is_empty() {
                self.store.delete_sessions(&ids).await?;
            }
            tracing::info!(shop = %context.shop(), removed = ids.len(), "app uninstalled");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthScopes, MemorySessionStore, Session};
    use crate::config::ShopDomain;

    fn session(id: &str, shop: &str) -> Session {
        Session::new(
            id.to_string(),
            ShopDomain::new(shop).unwrap(),
            "token".to_string(),
            AuthScopes::new(),
            false,
            None,
        )
    }

    fn context(shop: &str) -> WebhookContext {
        WebhookContext::new("app/uninstalled", ShopDomain::new(shop).unwrap(), None, None)
    }

    #[tokio::test]
    async fn test_uninstall_removes_only_that_shops_sessions() {
        let store = Arc::new(MemorySessionStore::new());
        store.store_session(session("offline_a.myshopify.com", "a")).await.unwrap();
        store.store_session(session("a.myshopify.com_7", "a")).await.unwrap();
        store.store_session(session("offline_b.myshopify.com", "b")).await.unwrap();

        let handler = AppUninstalledHandler::new(store.clone());
        handler
            .handle(&context("a"), &serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store
            .load_session("offline_b.myshopify.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_uninstall_is_idempotent() {
        let store = Arc::new(MemorySessionStore::new());
        store.store_session(session("offline_a.myshopify.com", "a")).await.unwrap();
        let handler = AppUninstalledHandler::new(store.clone());

        for _ in 0..2 {
            handler
                .handle(&context("a"), &serde_json::json!({}))
                .await
                .unwrap();
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_privacy_handler_acknowledges() {
        let ctx = WebhookContext::new("customers/redact", ShopDomain::new("a").unwrap(), None, None);
        assert!(PrivacyHandler
            .handle(&ctx, &serde_json::json!({"customer": {"email": "x@example.com"}}))
            .await
            .is_ok());
    }
}
