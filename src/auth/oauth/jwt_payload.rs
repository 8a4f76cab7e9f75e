//! App Bridge session tokens.
//!
//! Embedded apps call the backend with `Authorization: Bearer <token>`,
//! where the token is an HS256 JWT signed with the app secret. Its `dest`
//! claim names the shop and `sub` the admin user.

use crate::auth::oauth::OAuthError;
use crate::config::{ShopDomain, ShopifyConfig};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

const JWT_LEEWAY_SECS: u64 = 10;

/// Verified claims of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtPayload {
    /// Issuer, `https://{shop}/admin` for admin tokens.
    pub iss: String,
    /// Destination, `https://{shop}`.
    pub dest: String,
    /// Audience: the app's API key.
    pub aud: String,
    /// The admin user id.
    pub sub: Option<String>,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Not-before (seconds since epoch).
    pub nbf: i64,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Token id.
    pub jti: String,
    /// Admin session id.
    pub sid: Option<String>,
}

impl JwtPayload {
    /// Verifies `token` and returns its claims.
    ///
    /// The signature is checked with the primary secret and then the old
    /// one; `exp`/`nbf` allow ten seconds of clock skew; `aud` must equal
    /// the API key.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] when any check fails.
    pub fn decode(token: &str, config: &ShopifyConfig) -> Result<Self, OAuthError> {
        let mut last_error = None;
        let decoded = config
            .secret_keys()
            .find_map(|key| match Self::decode_with_key(token, key.as_ref()) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    last_error.get_or_insert(e);
                    None
                }
            });
        let Some(payload) = decoded else {
            return Err(OAuthError::InvalidJwt {
                reason: last_error.map_or_else(
                    || "Error decoding session token".to_string(),
                    |e| format!("Error decoding session token: {e}"),
                ),
            });
        };

        if payload.aud != config.api_key().as_ref() {
            return Err(OAuthError::InvalidJwt {
                reason: "Session token had invalid API key".to_string(),
            });
        }

        Ok(payload)
    }

    fn decode_with_key(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = JWT_LEEWAY_SECS;
        validation.validate_nbf = true;
        // aud is compared against the API key after decoding
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(secret.as_bytes());
        Ok(decode::<Self>(token, &key, &validation)?.claims)
    }

    /// The shop named by `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if `dest` is not a shop domain.
    pub fn shop(&self) -> Result<ShopDomain, OAuthError> {
        let host = self.dest.strip_prefix("https://").unwrap_or(&self.dest);
        ShopDomain::new(host).map_err(|_| OAuthError::InvalidJwt {
            reason: "Session token destination is not a shop domain".to_string(),
        })
    }

    /// The numeric admin user id, only for admin-issued tokens.
    #[must_use]
    pub fn shopify_user_id(&self) -> Option<u64> {
        if !self.iss.ends_with("/admin") {
            return None;
        }
        self.sub
            .as_deref()
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_digit()))
            .and_then(|sub| sub.parse().ok())
    }
}

// Verify JwtPayload is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JwtPayload>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Claims {
        iss: String,
        dest: String,
        aud: String,
        sub: Option<String>,
        exp: i64,
        nbf: i64,
        iat: i64,
        jti: String,
        sid: Option<String>,
    }

    fn config(primary: &str, old: Option<&str>) -> ShopifyConfig {
        let mut builder = ShopifyConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new(primary).unwrap());
        if let Some(old) = old {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn claims() -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            iss: "https://test-shop.myshopify.com/admin".to_string(),
            dest: "https://test-shop.myshopify.com".to_string(),
            aud: "test-api-key".to_string(),
            sub: Some("12345".to_string()),
            exp: now + 60,
            nbf: now - 5,
            iat: now - 5,
            jti: "jwt-id".to_string(),
            sid: Some("sid".to_string()),
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let token = sign(&claims(), "secret");
        let payload = JwtPayload::decode(&token, &config("secret", None)).unwrap();

        assert_eq!(payload.shop().unwrap().as_ref(), "test-shop.myshopify.com");
        assert_eq!(payload.shopify_user_id(), Some(12345));
    }

    #[test]
    fn test_decode_falls_back_to_old_secret() {
        let token = sign(&claims(), "old");
        assert!(JwtPayload::decode(&token, &config("new", Some("old"))).is_ok());
        assert!(JwtPayload::decode(&token, &config("new", None)).is_err());
    }

    #[test]
    fn test_rejects_wrong_audience() {
        let mut c = claims();
        c.aud = "another-app".to_string();
        let result = JwtPayload::decode(&sign(&c, "secret"), &config("secret", None));
        assert!(matches!(result, Err(OAuthError::InvalidJwt { .. })));
    }

    #[test]
    fn test_rejects_expired_token_beyond_leeway() {
        let mut c = claims();
        c.exp = chrono::Utc::now().timestamp() - 60;
        let result = JwtPayload::decode(&sign(&c, "secret"), &config("secret", None));
        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_expiry_within_leeway() {
        let mut c = claims();
        c.exp = chrono::Utc::now().timestamp() - 2;
        assert!(JwtPayload::decode(&sign(&c, "secret"), &config("secret", None)).is_ok());
    }

    #[test]
    fn test_rejects_malformed_token() {
        assert!(JwtPayload::decode("not.a.jwt", &config("secret", None)).is_err());
    }

    #[test]
    fn test_user_id_requires_admin_issuer() {
        let mut c = claims();
        c.iss = "https://test-shop.myshopify.com".to_string();
        let payload = JwtPayload::decode(&sign(&c, "secret"), &config("secret", None)).unwrap();
        assert_eq!(payload.shopify_user_id(), None);
    }

    #[test]
    fn test_shop_rejects_foreign_destination() {
        let mut c = claims();
        c.dest = "https://evil.example.com".to_string();
        let payload = JwtPayload::decode(&sign(&c, "secret"), &config("secret", None)).unwrap();
        assert!(payload.shop().is_err());
    }
}
