//! Session persistence.
//!
//! The gateway only depends on the [`SessionStore`] trait. A database-backed
//! store lives outside this crate; [`MemorySessionStore`] is enough for a
//! single process and for tests.

use crate::auth::Session;
use crate::config::ShopDomain;
use crate::BoxFuture;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors returned by a [`SessionStore`].
///
/// The gateway maps every variant to a 500 without echoing the message.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    #[error("Session store unavailable: {message}")]
    Unavailable {
        /// Backend-specific detail, logged but never returned to clients.
        message: String,
    },

    /// A stored record could not be decoded.
    #[error("Corrupt session record '{id}'")]
    Corrupt {
        /// The id of the record that failed to decode.
        id: String,
    },
}

/// Async, concurrency-safe session persistence.
///
/// Implementations must be safe to call from many requests at once; the
/// gateway adds no locking of its own.
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces a session under its id.
    fn store_session(&self, session: Session) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Loads a session by id.
    fn load_session<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<Session>, StoreError>>;

    /// Deletes a session by id. Deleting a missing id is not an error.
    fn delete_session<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Returns every session (offline and online) belonging to `shop`.
    fn find_sessions_by_shop<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Vec<Session>, StoreError>>;

    /// Deletes every listed session id.
    fn delete_sessions<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// In-process [`SessionStore`] backed by a `tokio` `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn store_session(&self, session: Session) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.sessions
                .write()
                .await
                .insert(session.id.clone(), session);
            Ok(())
        })
    }

    fn load_session<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Session>, StoreError>> {
        Box::pin(async move { Ok(self.sessions.read().await.get(id).cloned()) })
    }

    fn delete_session<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.sessions.write().await.remove(id);
            Ok(())
        })
    }

    fn find_sessions_by_shop<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Vec<Session>, StoreError>> {
        Box::pin(async move {
            Ok(self
                .sessions
                .read()
                .await
                .values()
                .filter(|s| &s.shop == shop)
                .cloned()
                .collect())
        })
    }

    fn delete_sessions<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            for id in ids {
                sessions.remove(id);
            }
            Ok(())
        })
    }
}

// Verify MemorySessionStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemorySessionStore>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn offline(shop: &str) -> Session {
        let shop = ShopDomain::new(shop).unwrap();
        Session::new(
            Session::offline_id(&shop),
            shop,
            "token".to_string(),
            "read_products".parse().unwrap(),
            false,
            None,
        )
    }

    fn online(shop: &str, user: &str) -> Session {
        let shop = ShopDomain::new(shop).unwrap();
        Session::new(
            Session::online_id(&shop, user),
            shop,
            "token".to_string(),
            "read_products".parse().unwrap(),
            true,
            None,
        )
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let store = MemorySessionStore::new();
        let session = offline("alpha");
        store.store_session(session.clone()).await.unwrap();

        let loaded = store.load_session(&session.id).await.unwrap();
        assert_eq!(loaded, Some(session));
        assert!(store.load_session("offline_missing.myshopify.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_replaces_existing_id() {
        let store = MemorySessionStore::new();
        store.store_session(offline("alpha")).await.unwrap();

        let mut updated = offline("alpha");
        updated.access_token = "rotated".to_string();
        store.store_session(updated).await.unwrap();

        assert_eq!(store.len().await, 1);
        let loaded = store
            .load_session("offline_alpha.myshopify.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.access_token, "rotated");
    }

    #[tokio::test]
    async fn test_find_and_delete_by_shop() {
        let store = MemorySessionStore::new();
        store.store_session(offline("alpha")).await.unwrap();
        store.store_session(online("alpha", "7")).await.unwrap();
        store.store_session(offline("beta")).await.unwrap();

        let alpha = ShopDomain::new("alpha").unwrap();
        let found = store.find_sessions_by_shop(&alpha).await.unwrap();
        assert_eq!(found.len(), 2);

        let ids: Vec<String> = found.into_iter().map(|s| s.id).collect();
        store.delete_sessions(&ids).await.unwrap();

        assert!(store.find_sessions_by_shop(&alpha).await.unwrap().is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_delete_missing_id_is_ok() {
        let store = MemorySessionStore::new();
        tokio_test::block_on(async {
            store.delete_session("nope").await.unwrap();
            assert!(store.is_empty().await);
        });
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::Unavailable {
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
        let err = StoreError::Corrupt {
            id: "offline_x".to_string(),
        };
        assert!(err.to_string().contains("offline_x"));
    }
}
