//! Resolving which shop, and which stored session, a request speaks for.
//!
//! Sources, first match wins:
//!
//! 1. `Authorization: Bearer <session token>`
//! 2. the signed `shopify_app_session` cookie
//! 3. the `shop` query parameter (offline session)
//!
//! A `shop` query parameter that names another shop than the token or
//! cookie makes the request invalid.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};
use thiserror::Error;

use crate::auth::oauth::{JwtPayload, OAuthError};
use crate::auth::Session;
use crate::config::{AppConfig, ShopDomain};
use crate::gateway::cookies::{read_signed_cookie, SignedCookie, SESSION_COOKIE};

/// Whether a failed request should be redirected or answered with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A top-level page load.
    Navigation,
    /// A `fetch`/XHR call or any non-browser client.
    Api,
}

impl RequestKind {
    /// Classifies a request by its Fetch-Metadata headers.
    ///
    /// Requests carrying `Authorization` are always API calls; otherwise
    /// `Sec-Fetch-Mode: navigate` or `Sec-Fetch-Dest: document` marks a
    /// navigation.
    #[must_use]
    pub fn of(headers: &HeaderMap) -> Self {
        if headers.contains_key(AUTHORIZATION) {
            return Self::Api;
        }
        let has = |name: &str, expected: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case(expected))
        };
        if has("sec-fetch-mode", "navigate") || has("sec-fetch-dest", "document") {
            Self::Navigation
        } else {
            Self::Api
        }
    }
}

/// Where a [`ShopContext`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// An App Bridge session token.
    SessionToken,
    /// The signed session cookie.
    Cookie,
    /// The `shop` query parameter.
    ShopParam,
}

/// The shop and session id a request claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopContext {
    /// Claimed shop.
    pub shop: ShopDomain,
    /// Id of the session to load.
    pub session_id: String,
    /// Source of the claim.
    pub source: ContextSource,
}

/// Reasons a request's claimed context is rejected outright.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The bearer token failed verification.
    #[error("session token rejected: {0}")]
    InvalidToken(#[source] OAuthError),

    /// The session cookie's signature did not match.
    #[error("session cookie signature mismatch")]
    ForgedCookie,

    /// The cookie value is not a session id.
    #[error("session cookie does not name a session")]
    MalformedCookie,

    /// The `shop` query parameter is not a shop domain.
    #[error("shop parameter '{0}' is invalid")]
    InvalidShopParam(String),

    /// The `shop` query parameter disagrees with the authenticated shop.
    #[error("request shop {claimed} does not match authenticated shop {authenticated}")]
    ShopMismatch {
        /// Shop named by the query parameter.
        claimed: ShopDomain,
        /// Shop named by the token or cookie.
        authenticated: ShopDomain,
    },
}

/// Reads the `shop` query parameter.
///
/// `None` when absent or blank, `Some(Err(raw))` when malformed.
#[must_use]
pub fn query_shop(uri: &Uri) -> Option<Result<ShopDomain, String>> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    let raw = params.get("shop").map(|s| s.trim()).filter(|s| !s.is_empty())?;
    Some(ShopDomain::new(raw).map_err(|_| raw.to_string()))
}

/// Resolves the shop context of a request without touching the store.
///
/// Returns `Ok(None)` when the request carries no shop context at all.
///
/// # Errors
///
/// Returns [`ContextError`] when a presented credential is invalid or the
/// shop parameter contradicts it.
pub fn resolve_context(
    headers: &HeaderMap,
    uri: &Uri,
    config: &AppConfig,
) -> Result<Option<ShopContext>, ContextError> {
    let param_shop = query_shop(uri)
        .transpose()
        .map_err(ContextError::InvalidShopParam)?;

    let claimed = if let Some(token) = bearer_token(headers) {
        let payload =
            JwtPayload::decode(token, config.shopify()).map_err(ContextError::InvalidToken)?;
        let shop = payload.shop().map_err(ContextError::InvalidToken)?;
        let session_id = match payload.shopify_user_id() {
            Some(user) if config.use_online_tokens() => Session::online_id(&shop, &user.to_string()),
            _ => Session::offline_id(&shop),
        };
        Some(ShopContext {
            shop,
            session_id,
            source: ContextSource::SessionToken,
        })
    } else {
        match read_signed_cookie(headers, SESSION_COOKIE, config.shopify()) {
            SignedCookie::Valid(session_id) => {
                let shop = shop_from_session_id(&session_id).ok_or(ContextError::MalformedCookie)?;
                Some(ShopContext {
                    shop,
                    session_id,
                    source: ContextSource::Cookie,
                })
            }
            SignedCookie::Forged => return Err(ContextError::ForgedCookie),
            SignedCookie::Absent => None,
        }
    };

    match (claimed, param_shop) {
        (Some(context), Some(param)) if param != context.shop => Err(ContextError::ShopMismatch {
            claimed: param,
            authenticated: context.shop,
        }),
        (Some(context), _) => Ok(Some(context)),
        (None, Some(shop)) => Ok(Some(ShopContext {
            session_id: Session::offline_id(&shop),
            shop,
            source: ContextSource::ShopParam,
        })),
        (None, None) => Ok(None),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Recovers the shop from `offline_{shop}` or `{shop}_{user}`.
fn shop_from_session_id(id: &str) -> Option<ShopDomain> {
    let shop = id
        .strip_prefix("offline_")
        .or_else(|| id.rsplit_once('_').map(|(shop, _)| shop))?;
    ShopDomain::new(shop).ok()
}
