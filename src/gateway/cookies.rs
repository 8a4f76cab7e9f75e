//! Signed cookies for the OAuth state nonce and the non-embedded session.
//!
//! A signed cookie `name=value` travels with a companion `name.sig` holding
//! the base64 HMAC-SHA256 of the value under the app secret.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;

use crate::auth::oauth::hmac::{compute_signature_base64, verify_base64_signature};
use crate::config::ShopifyConfig;

/// Session id cookie set by the OAuth callback.
pub const SESSION_COOKIE: &str = "shopify_app_session";
/// OAuth state nonce cookie set by the begin route.
pub const STATE_COOKIE: &str = "shopify_app_state";

const STATE_MAX_AGE_SECS: u64 = 600;

/// Outcome of reading a signed cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedCookie {
    /// The cookie was not sent.
    Absent,
    /// The value and its signature match.
    Valid(String),
    /// The value was sent without a matching signature.
    Forged,
}

/// Returns the value of cookie `name` from the request headers.
#[must_use]
pub fn extract_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
        })
}

/// Reads cookie `name` and checks its `name.sig` companion.
#[must_use]
pub fn read_signed_cookie(headers: &HeaderMap, name: &str, config: &ShopifyConfig) -> SignedCookie {
    let Some(value) = extract_cookie_value(headers, name) else {
        return SignedCookie::Absent;
    };
    let signature = extract_cookie_value(headers, &signature_name(name)).unwrap_or_default();
    if verify_base64_signature(value.as_bytes(), &signature, config) {
        SignedCookie::Valid(value)
    } else {
        SignedCookie::Forged
    }
}

/// `Set-Cookie` values for a signed cookie: the value and its signature.
#[must_use]
pub fn signed_cookie(
    name: &str,
    value: &str,
    config: &ShopifyConfig,
    max_age_secs: Option<u64>,
) -> [String; 2] {
    let signature = compute_signature_base64(value.as_bytes(), config.api_secret_key().as_ref());
    let secure = config.host().is_some_and(crate::config::HostUrl::is_https);
    [
        cookie_header(name, value, secure, max_age_secs),
        cookie_header(&signature_name(name), &signature, secure, max_age_secs),
    ]
}

/// `Set-Cookie` values for the OAuth state cookie.
#[must_use]
pub fn state_cookie(state: &str, config: &ShopifyConfig) -> [String; 2] {
    signed_cookie(STATE_COOKIE, state, config, Some(STATE_MAX_AGE_SECS))
}

/// `Set-Cookie` values that delete a signed cookie.
#[must_use]
pub fn clear_signed_cookie(name: &str) -> [String; 2] {
    [clear_cookie(name), clear_cookie(&signature_name(name))]
}

/// Appends `Set-Cookie` headers to `response`, skipping values that are not
/// valid header text.
pub fn append_set_cookies<I>(response: &mut Response, cookies: I)
where
    I: IntoIterator<Item = String>,
{
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

fn signature_name(name: &str) -> String {
    format!("{name}.sig")
}

fn cookie_header(name: &str, value: &str, secure: bool, max_age_secs: Option<u64>) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    cookie
}

fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(host: &str) -> ShopifyConfig {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .host(HostUrl::new(host).unwrap())
            .build()
            .unwrap()
    }

    fn headers_from(set_cookies: &[String]) -> HeaderMap {
        let pairs: Vec<&str> = set_cookies
            .iter()
            .filter_map(|c| c.split(';').next())
            .collect();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());
        headers
    }

    #[test]
    fn test_extract_cookie_value_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; shopify_app_state=abc; b=2"));
        assert_eq!(
            extract_cookie_value(&headers, STATE_COOKIE),
            Some("abc".to_string())
        );
        assert_eq!(extract_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_signed_cookie_round_trip() {
        let config = config("https://app.example.com");
        let cookies = signed_cookie(SESSION_COOKIE, "offline_a.myshopify.com", &config, None);
        assert!(cookies[0].contains("; Secure"));

        let headers = headers_from(&cookies);
        assert_eq!(
            read_signed_cookie(&headers, SESSION_COOKIE, &config),
            SignedCookie::Valid("offline_a.myshopify.com".to_string())
        );
    }

    #[test]
    fn test_unsigned_or_altered_cookie_is_forged() {
        let config = config("http://localhost:8081");
        let mut cookies = signed_cookie(SESSION_COOKIE, "offline_a.myshopify.com", &config, None);
        assert!(!cookies[0].contains("Secure"));
        cookies[0] = format!("{SESSION_COOKIE}=offline_b.myshopify.com");

        let headers = headers_from(&cookies);
        assert_eq!(
            read_signed_cookie(&headers, SESSION_COOKIE, &config),
            SignedCookie::Forged
        );
        assert_eq!(
            read_signed_cookie(&HeaderMap::new(), SESSION_COOKIE, &config),
            SignedCookie::Absent
        );
    }

    #[test]
    fn test_state_cookie_expires() {
        let cookies = state_cookie("nonce", &config("https://app.example.com"));
        assert!(cookies[0].starts_with("shopify_app_state=nonce;"));
        assert!(cookies[0].contains("Max-Age=600"));
        assert!(cookies[1].starts_with("shopify_app_state.sig="));
    }

    #[test]
    fn test_clear_signed_cookie() {
        let cleared = clear_signed_cookie(STATE_COOKIE);
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
    }
}
