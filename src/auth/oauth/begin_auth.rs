//! Building the authorize redirect that starts OAuth.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::StateParam;
use crate::auth::AuthScopes;
use crate::config::{ShopDomain, ShopifyConfig};

/// The authorize URL to redirect the merchant to, and the state nonce the
/// caller must remember until the callback arrives.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// `https://{shop}/admin/oauth/authorize?...`
    pub auth_url: String,

    /// Nonce embedded in `auth_url`.
    pub state: StateParam,
}

/// Builds the authorize URL for `shop`.
///
/// The redirect URI is the configured host joined with `redirect_path`.
/// `is_online` requests a per-user token via `grant_options[]=per-user`.
///
/// # Errors
///
/// Returns [`OAuthError::MissingHostConfig`] when no host is configured.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::auth::oauth::begin_auth;
/// use storefront_gateway::{ApiKey, ApiSecretKey, HostUrl, ShopDomain, ShopifyConfig};
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://app.example.com").unwrap())
///     .build()
///     .unwrap();
/// let shop = ShopDomain::new("my-store").unwrap();
///
/// let result = begin_auth(&config, &shop, "/api/auth/callback", false, None).unwrap();
/// assert!(result.auth_url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?"));
/// ```
pub fn begin_auth(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    redirect_path: &str,
    is_online: bool,
    scope_override: Option<&AuthScopes>,
) -> Result<BeginAuthResult, OAuthError> {
    let host = config.host().ok_or(OAuthError::MissingHostConfig)?;
    let state = StateParam::new();
    let scopes = scope_override.unwrap_or_else(|| config.scopes());

    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", format!("{}{redirect_path}", host.as_ref())),
        ("state", state.to_string()),
    ];
    if is_online {
        params.push(("grant_options[]", "per-user".to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(BeginAuthResult {
        auth_url: format!("https://{shop}/admin/oauth/authorize?{query_string}"),
        state,
    })
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
