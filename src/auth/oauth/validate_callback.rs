//! OAuth callback validation and authorization-code exchange.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::{constant_time_compare, validate_hmac};
use crate::auth::oauth::AuthQuery;
use crate::auth::session::AccessTokenResponse;
use crate::auth::Session;
use crate::config::{ShopDomain, ShopifyConfig};

#[derive(serde::Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Validates an OAuth callback and exchanges its code for a [`Session`].
///
/// Steps, each of which short-circuits:
///
/// 1. The query HMAC must verify under the primary or old secret.
/// 2. `state` must equal `expected_state` (constant-time).
/// 3. `shop` must be a valid shop domain.
/// 4. The code is POSTed to `{admin origin}/admin/oauth/access_token`.
///
/// The returned session records the callback's `state` nonce.
///
/// # Errors
///
/// - [`OAuthError::InvalidHmac`] when the signature does not verify
/// - [`OAuthError::StateMismatch`] when the nonce differs
/// - [`OAuthError::InvalidCallback`] when the shop domain is invalid
/// - [`OAuthError::TokenExchangeFailed`] on network failure, a non-2xx
///   response or an unparseable body
pub async fn validate_auth_callback(
    config: &ShopifyConfig,
    http: &reqwest::Client,
    auth_query: &AuthQuery,
    expected_state: &str,
) -> Result<Session, OAuthError> {
    if !validate_hmac(auth_query, config) {
        return Err(OAuthError::InvalidHmac);
    }

    if !constant_time_compare(&auth_query.state, expected_state) {
        return Err(OAuthError::StateMismatch);
    }

    let shop = ShopDomain::new(&auth_query.shop).map_err(|_| OAuthError::InvalidCallback {
        reason: "invalid shop domain".to_string(),
    })?;

    let token_url = format!("{}/admin/oauth/access_token", config.admin_origin(&shop));
    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code: &auth_query.code,
    };

    let response = http
        .post(&token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: format!("Network error: {e}"),
        })?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(OAuthError::TokenExchangeFailed {
            status,
            message: error_body,
        });
    }

    let token_response: AccessTokenResponse =
        response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status,
                message: format!("Failed to parse token response: {e}"),
            })?;

    tracing::info!(shop = %shop, online = token_response.associated_user.is_some(), "oauth token exchanged");
    let mut session = Session::from_access_token_response(shop, &token_response);
    session.state = Some(auth_query.state.clone());
    Ok(session)
}
