//! The OAuth callback query string.

use crate::auth::oauth::OAuthError;
use std::collections::BTreeMap;

/// Parameters Shopify appends to the OAuth callback URL.
///
/// The `hmac` covers every other parameter, so unknown parameters are kept
/// in `extra` and included in [`AuthQuery::to_signable_string`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthQuery {
    /// Authorization code to exchange for a token.
    pub code: String,
    /// The shop domain as sent by Shopify.
    pub shop: String,
    /// Unix timestamp of the redirect.
    pub timestamp: String,
    /// Echo of the state nonce issued at begin.
    pub state: String,
    /// Base64 admin host, used by embedded apps.
    pub host: String,
    /// Hex HMAC-SHA256 of the remaining parameters.
    pub hmac: String,
    /// Any other parameters, signed along with the named ones.
    pub extra: BTreeMap<String, String>,
}

impl AuthQuery {
    /// Creates a query from its named parts.
    #[must_use]
    pub const fn new(
        code: String,
        shop: String,
        timestamp: String,
        state: String,
        host: String,
        hmac: String,
    ) -> Self {
        Self {
            code,
            shop,
            timestamp,
            state,
            host,
            hmac,
            extra: BTreeMap::new(),
        }
    }

    /// Builds a query from the decoded callback parameters.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidCallback`] when `code`, `shop`, `state`
    /// or `hmac` is missing or empty.
    pub fn from_params(mut params: BTreeMap<String, String>) -> Result<Self, OAuthError> {
        let mut take = |name: &'static str, required: bool| -> Result<String, OAuthError> {
            match params.remove(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ if required => Err(OAuthError::InvalidCallback {
                    reason: format!("missing '{name}' parameter"),
                }),
                _ => Ok(String::new()),
            }
        };

        let code = take("code", true)?;
        let shop = take("shop", true)?;
        let state = take("state", true)?;
        let hmac = take("hmac", true)?;
        let timestamp = take("timestamp", false)?;
        let host = take("host", false)?;
        params.remove("signature");

        Ok(Self {
            code,
            shop,
            timestamp,
            state,
            host,
            hmac,
            extra: params,
        })
    }

    /// Returns the `key=value` pairs covered by the HMAC, sorted by key and
    /// joined with `&`. `hmac` and `signature` are excluded, as are empty
    /// optional fields.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        let mut pairs: BTreeMap<&str, &str> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        for (key, value) in [
            ("code", &self.code),
            ("host", &self.host),
            ("shop", &self.shop),
            ("state", &self.state),
            ("timestamp", &self.timestamp),
        ] {
            if !value.is_empty() {
                pairs.insert(key, value);
            }
        }

        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}
