//! Per-shop session records.
//!
//! A [`Session`] is created by the OAuth callback, read by the session
//! validation middleware and the installation gate, and deleted when the app
//! is uninstalled. The gateway never mutates a stored session.

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated session for one shop (offline) or one shop user (online).
///
/// # Example
///
/// ```rust
/// use storefront_gateway::{AuthScopes, Session, ShopDomain};
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "access-token".to_string(),
///     "write_products".parse().unwrap(),
///     false,
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.myshopify.com");
/// assert!(session.is_active(&"read_products".parse().unwrap()));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Store key: `offline_{shop}` or `{shop}_{user_id}`.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The Admin API access token.
    pub access_token: String,

    /// Scopes granted when the token was issued.
    pub scopes: AuthScopes,

    /// Whether this is an online (per-user) session.
    pub is_online: bool,

    /// Expiry for online sessions; offline sessions never expire.
    pub expires: Option<DateTime<Utc>>,

    /// OAuth state the session was created under, if recorded.
    pub state: Option<String>,

    /// The admin user an online session belongs to.
    pub associated_user_id: Option<u64>,
}

impl Session {
    /// Creates a new session with the specified parameters.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scopes: AuthScopes,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            access_token,
            scopes,
            is_online,
            expires,
            state: None,
            associated_user_id: None,
        }
    }

    /// Session id of the shop-wide offline session.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{shop}")
    }

    /// Session id of an online session for `user_id` on `shop`.
    #[must_use]
    pub fn online_id(shop: &ShopDomain, user_id: &str) -> String {
        format!("{shop}_{user_id}")
    }

    /// Builds a session from the token endpoint's response.
    #[must_use]
    pub fn from_access_token_response(shop: ShopDomain, response: &AccessTokenResponse) -> Self {
        let scopes: AuthScopes = response.scope.parse().unwrap_or_default();

        match (&response.associated_user, response.expires_in) {
            (Some(user), expires_in) => {
                let mut session = Self::new(
                    Self::online_id(&shop, &user.id.to_string()),
                    shop,
                    response.access_token.clone(),
                    scopes,
                    true,
                    expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
                );
                session.associated_user_id = Some(user.id);
                session
            }
            (None, _) => Self::new(
                Self::offline_id(&shop),
                shop,
                response.access_token.clone(),
                scopes,
                false,
                None,
            ),
        }
    }

    /// Returns `true` if this session has expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if the session can authorize a request that needs
    /// `required` scopes: it has a token, has not expired, and its granted
    /// scopes cover `required`.
    #[must_use]
    pub fn is_active(&self, required: &AuthScopes) -> bool {
        !self.access_token.is_empty() && !self.expired() && self.scopes.covers(required)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("scopes", &self.scopes)
            .field("is_online", &self.is_online)
            .field("expires", &self.expires)
            .field("associated_user_id", &self.associated_user_id)
            .finish_non_exhaustive()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// Body of a successful `POST /admin/oauth/access_token`.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued token.
    pub access_token: String,
    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds, present for online tokens.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// The authorizing user, present for online tokens.
    #[serde(default)]
    pub associated_user: Option<TokenUser>,
}

/// The subset of the authorizing user the gateway keeps.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenUser {
    /// Numeric admin user id.
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str, scopes: &str, expires: Option<DateTime<Utc>>) -> Session {
        let shop = ShopDomain::new("shop").unwrap();
        Session::new(
            Session::offline_id(&shop),
            shop,
            token.to_string(),
            scopes.parse().unwrap(),
            false,
            expires,
        )
    }

    #[test]
    fn test_session_ids() {
        let shop = ShopDomain::new("shop").unwrap();
        assert_eq!(Session::offline_id(&shop), "offline_shop.myshopify.com");
        assert_eq!(Session::online_id(&shop, "42"), "shop.myshopify.com_42");
    }

    #[test]
    fn test_session_expired() {
        assert!(session("t", "", Some(Utc::now() - Duration::hours(1))).expired());
        assert!(!session("t", "", Some(Utc::now() + Duration::hours(1))).expired());
        assert!(!session("t", "", None).expired());
    }

    #[test]
    fn test_is_active_requires_token_freshness_and_scopes() {
        let required: AuthScopes = "write_products".parse().unwrap();

        assert!(session("token", "write_products", None).is_active(&required));
        assert!(!session("", "write_products", None).is_active(&required));
        assert!(!session(
            "token",
            "write_products",
            Some(Utc::now() - Duration::minutes(1))
        )
        .is_active(&required));
        assert!(!session("token", "read_products", None).is_active(&required));
    }

    #[test]
    fn test_offline_session_from_token_response() {
        let response: AccessTokenResponse = serde_json::from_str(
            r#"{"access_token":"shpat_abc","scope":"write_products"}"#,
        )
        .unwrap();
        let session =
            Session::from_access_token_response(ShopDomain::new("shop").unwrap(), &response);

        assert_eq!(session.id, "offline_shop.myshopify.com");
        assert!(!session.is_online);
        assert!(session.expires.is_none());
        assert!(session.scopes.contains("read_products"));
    }

    #[test]
    fn test_online_session_from_token_response() {
        let response: AccessTokenResponse = serde_json::from_str(
            r#"{"access_token":"shpua_abc","scope":"read_products","expires_in":86399,
                "associated_user_scope":"read_products","associated_user":{"id":902541635,"email":"x@y.z"}}"#,
        )
        .unwrap();
        let session =
            Session::from_access_token_response(ShopDomain::new("shop").unwrap(), &response);

        assert_eq!(session.id, "shop.myshopify.com_902541635");
        assert!(session.is_online);
        assert_eq!(session.associated_user_id, Some(902_541_635));
        assert!(session.expires.is_some());
        assert!(!session.expired());
    }

    #[test]
    fn test_debug_masks_access_token() {
        let debug = format!("{:?}", session("shpat_secret", "", None));
        assert!(!debug.contains("shpat_secret"));
        assert!(debug.contains("offline_shop.myshopify.com"));
    }

    #[test]
    fn test_session_serde_round_trip_preserves_fields() {
        let mut original = session("token", "write_orders", None);
        original.state = Some("nonce".to_string());
        let json = serde_json::to_string(&original).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
