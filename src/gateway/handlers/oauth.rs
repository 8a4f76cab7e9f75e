//! OAuth begin and callback routes.

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::auth::oauth::{begin_auth, validate_auth_callback, AuthQuery};
use crate::auth::Session;
use crate::config::{AppConfig, ShopDomain};
use crate::gateway::cookies::{
    append_set_cookies, clear_signed_cookie, read_signed_cookie, signed_cookie, state_cookie,
    SignedCookie, SESSION_COOKIE, STATE_COOKIE,
};
use crate::gateway::error::GatewayError;
use crate::gateway::found;
use crate::gateway::state::AppState;

/// `GET <auth path>?shop=`: redirects to the platform's authorize page and
/// remembers the state nonce in a signed cookie.
///
/// # Errors
///
/// [`GatewayError::MissingShop`] for a missing or malformed shop, and
/// [`GatewayError::OAuth`] when no host is configured.
pub async fn begin(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    let shop = params
        .get("shop")
        .and_then(|s| ShopDomain::new(s.trim()).ok())
        .ok_or(GatewayError::MissingShop)?;

    let config = state.config();
    let result = begin_auth(
        config.shopify(),
        &shop,
        config.auth_callback_path(),
        config.use_online_tokens(),
        None,
    )?;

    tracing::info!(shop = %shop, online = config.use_online_tokens(), "oauth started");
    let mut response = found(&result.auth_url);
    append_set_cookies(&mut response, state_cookie(result.state.as_ref(), config.shopify()));
    Ok(response)
}

/// `GET <callback path>`: verifies the callback, exchanges the code, stores
/// the session and redirects to the app root.
///
/// # Errors
///
/// [`GatewayError::OAuth`] for invalid callbacks (400) or failed token
/// exchange (502), [`GatewayError::Store`] when the session cannot be saved.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, GatewayError> {
    let config = state.config();

    // An absent or forged state cookie leaves nothing to match against.
    let expected_state = match read_signed_cookie(&headers, STATE_COOKIE, config.shopify()) {
        SignedCookie::Valid(value) => value,
        SignedCookie::Absent | SignedCookie::Forged => String::new(),
    };

    let host = params.get("host").cloned().unwrap_or_default();
    let query = AuthQuery::from_params(params)?;
    let session =
        validate_auth_callback(config.shopify(), state.http(), &query, &expected_state).await?;
    state.sessions().store_session(session.clone()).await?;
    tracing::info!(shop = %session.shop, online = session.is_online, "session stored");

    let mut response = found(&app_root(config, &session, &host));
    append_set_cookies(&mut response, clear_signed_cookie(STATE_COOKIE));
    append_set_cookies(
        &mut response,
        signed_cookie(SESSION_COOKIE, &session.id, config.shopify(), cookie_max_age(&session)),
    );
    Ok(response)
}

/// Embedded apps land inside the admin; others on the local root.
fn app_root(config: &AppConfig, session: &Session, host: &str) -> String {
    if config.shopify().is_embedded() {
        format!(
            "https://{}/admin/apps/{}",
            session.shop,
            config.shopify().api_key().as_ref()
        )
    } else {
        format!(
            "/?shop={}&host={}",
            urlencoding::encode(session.shop.as_ref()),
            urlencoding::encode(host)
        )
    }
}

fn cookie_max_age(session: &Session) -> Option<u64> {
    session.expires.map(|expires| {
        u64::try_from((expires - chrono::Utc::now()).num_seconds()).unwrap_or(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ShopifyConfig};

    fn config(embedded: bool) -> AppConfig {
        let shopify = ShopifyConfig::builder()
            .api_key(ApiKey::new("api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .is_embedded(embedded)
            .build()
            .unwrap();
        AppConfig::builder(shopify).build().unwrap()
    }

    fn session(expires: Option<chrono::DateTime<chrono::Utc>>) -> Session {
        let shop = ShopDomain::new("a").unwrap();
        Session::new(
            Session::offline_id(&shop),
            shop,
            "token".to_string(),
            crate::auth::AuthScopes::new(),
            false,
            expires,
        )
    }

    #[test]
    fn test_app_root_embedded() {
        assert_eq!(
            app_root(&config(true), &session(None), "aG9zdA"),
            "https://a.myshopify.com/admin/apps/api-key"
        );
    }

    #[test]
    fn test_app_root_standalone_keeps_host() {
        assert_eq!(
            app_root(&config(false), &session(None), "aG9zdA=="),
            "/?shop=a.myshopify.com&host=aG9zdA%3D%3D"
        );
    }

    #[test]
    fn test_cookie_max_age_follows_expiry() {
        assert_eq!(cookie_max_age(&session(None)), None);
        let later = chrono::Utc::now() + chrono::Duration::seconds(3600);
        assert!(cookie_max_age(&session(Some(later))).is_some_and(|s| s > 3500));
        let past = chrono::Utc::now() - chrono::Duration::seconds(10);
        assert_eq!(cookie_max_age(&session(Some(past))), Some(0));
    }
}
