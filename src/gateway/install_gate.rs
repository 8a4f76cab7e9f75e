//! Installation gate for the catch-all page route.
//!
//! Each request makes exactly one decision: serve the application shell to
//! an installed shop, or send the merchant into OAuth.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::{AuthScopes, Session, SessionStore, StoreError};
use crate::config::ShopDomain;
use crate::gateway::error::GatewayError;
use crate::gateway::found;
use crate::gateway::middleware::auth_url;
use crate::gateway::state::AppState;

/// File served as the application shell.
pub const SHELL_FILE: &str = "index.html";

/// Whether a shop has completed installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    /// No usable session; OAuth must run.
    Installing,
    /// An active session exists for the shop.
    Installed,
}

/// Finds the session that stands for `shop` as a whole.
///
/// The offline session wins when it is active. Apps that request online
/// tokens only ever store per-user sessions, so any active session of the
/// shop is accepted next. Failing both, the offline session is returned as
/// is (possibly inactive) so callers can tell stale from absent.
///
/// # Errors
///
/// Propagates store failures.
pub async fn shop_session(
    store: &dyn SessionStore,
    shop: &ShopDomain,
    required: &AuthScopes,
) -> Result<Option<Session>, StoreError> {
    let offline = store
        .load_session(&Session::offline_id(shop))
        .await?
        .filter(|session| session.shop == *shop);
    if offline.as_ref().is_some_and(|s| s.is_active(required)) {
        return Ok(offline);
    }

    let active = store
        .find_sessions_by_shop(shop)
        .await?
        .into_iter()
        .find(|session| session.shop == *shop && session.is_active(required));
    Ok(active.or(offline))
}

/// Derives the installation state of `shop` from its stored sessions.
///
/// # Errors
///
/// Propagates store failures.
pub async fn installation_state(
    store: &dyn SessionStore,
    shop: &ShopDomain,
    required: &AuthScopes,
) -> Result<InstallationState, StoreError> {
    Ok(match shop_session(store, shop, required).await? {
        Some(session) if session.is_active(required) => InstallationState::Installed,
        _ => InstallationState::Installing,
    })
}

/// Serves the shell or redirects to the OAuth begin route.
///
/// `shop` is required; `host` is carried into the redirect when present.
///
/// # Errors
///
/// - [`GatewayError::MissingShop`] when `shop` is missing or malformed
/// - [`GatewayError::Store`] when the session lookup fails
/// - [`GatewayError::Shell`] when the shell file cannot be read
pub async fn install_gate(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    let shop = params
        .get("shop")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .and_then(|s| ShopDomain::new(s).ok())
        .ok_or(GatewayError::MissingShop)?;

    let config = state.config();
    match installation_state(state.sessions(), &shop, config.shopify().scopes()).await? {
        InstallationState::Installing => {
            let mut location = auth_url(config, &shop);
            if let Some(host) = params.get("host").filter(|h| !h.is_empty()) {
                location.push_str("&host=");
                location.push_str(&urlencoding::encode(host));
            }
            tracing::info!(shop = %shop, "shop not installed, starting oauth");
            Ok(found(&location))
        }
        InstallationState::Installed => {
            let shell = tokio::fs::read(config.static_root().join(SHELL_FILE))
                .await
                .map_err(GatewayError::Shell)?;
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                shell,
            )
                .into_response())
        }
    }
}
