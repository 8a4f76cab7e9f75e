//! Configuration for the gateway.
//!
//! Two layers live here:
//!
//! - [`ShopifyConfig`]: platform credentials and app identity, built with
//!   [`ShopifyConfigBuilder`] from validated newtypes.
//! - [`AppConfig`]: the process-level settings (port, static root, route
//!   paths, webhook limits, passthrough credentials) wrapping a
//!   `ShopifyConfig`, loaded from the environment with
//!   [`AppConfig::from_env`].
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::{ApiKey, ApiSecretKey, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .scopes("write_products".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert!(config.is_embedded());
//! ```

mod app;
mod newtypes;
mod version;

pub use app::{AppConfig, AppConfigBuilder, PassthroughSettings, RuntimeEnvironment};
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Platform credentials and app identity.
///
/// # Key Rotation
///
/// When `old_api_secret_key` is set, every signature check (webhooks, OAuth
/// callbacks, session tokens) tries the primary secret first and falls back
/// to the old one, so deliveries signed before a rotation still verify.
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
    api_version: ApiVersion,
    is_embedded: bool,
    user_agent_prefix: Option<String>,
    admin_origin_override: Option<HostUrl>,
}

impl ShopifyConfig {
    /// Creates a new builder for constructing a `ShopifyConfig`.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous API secret key, if one is still honoured.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the secrets to try when verifying a signature, primary first.
    pub fn secret_keys(&self) -> impl Iterator<Item = &ApiSecretKey> {
        std::iter::once(&self.api_secret_key).chain(self.old_api_secret_key.as_ref())
    }

    /// Returns the scopes the app requests and requires.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public host URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.is_embedded
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the origin for Admin API and token-exchange calls to `shop`.
    ///
    /// This is `https://{shop}` unless an override origin is configured.
    #[must_use]
    pub fn admin_origin(&self, shop: &ShopDomain) -> String {
        self.admin_origin_override
            .as_ref()
            .map_or_else(|| format!("https://{shop}"), |o| o.as_ref().to_string())
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Builder for [`ShopifyConfig`].
///
/// `api_key` and `api_secret_key` are required. Defaults: latest API
/// version, embedded, no scopes, no host, no admin origin override.
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    api_version: Option<ApiVersion>,
    is_embedded: Option<bool>,
    user_agent_prefix: Option<String>,
    admin_origin_override: Option<HostUrl>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous secret key during a rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public host URL used to build the OAuth redirect URI.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(mut self, embedded: bool) -> Self {
        self.is_embedded = Some(embedded);
        self
    }

    /// Sets the user agent prefix for outbound requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Routes Admin API and token-exchange calls to `origin` instead of the
    /// shop's own domain. Intended for proxies and local test servers.
    #[must_use]
    pub fn admin_origin_override(mut self, origin: HostUrl) -> Self {
        self.admin_origin_override = Some(origin);
        self
    }

    /// Builds the [`ShopifyConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        Ok(ShopifyConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host: self.host,
            api_version: self.api_version.unwrap_or_else(ApiVersion::latest),
            is_embedded: self.is_embedded.unwrap_or(true),
            user_agent_prefix: self.user_agent_prefix,
            admin_origin_override: self.admin_origin_override,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ShopifyConfigBuilder {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = ShopifyConfigBuilder::new()
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "api_key" })
        ));
    }

    #[test]
    fn test_builder_requires_api_secret_key() {
        let result = ShopifyConfigBuilder::new()
            .api_key(ApiKey::new("key").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "api_secret_key"
            })
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let config = minimal().build().unwrap();

        assert_eq!(config.api_version(), &ApiVersion::latest());
        assert!(config.is_embedded());
        assert!(config.scopes().is_empty());
        assert!(config.host().is_none());
        assert!(config.old_api_secret_key().is_none());
        assert!(config.user_agent_prefix().is_none());
    }

    #[test]
    fn test_secret_keys_yields_primary_then_old() {
        let config = minimal()
            .old_api_secret_key(ApiSecretKey::new("old-secret").unwrap())
            .build()
            .unwrap();

        let keys: Vec<&str> = config.secret_keys().map(AsRef::as_ref).collect();
        assert_eq!(keys, vec!["secret", "old-secret"]);

        let single = minimal().build().unwrap();
        assert_eq!(single.secret_keys().count(), 1);
    }

    #[test]
    fn test_admin_origin_defaults_to_shop_domain() {
        let config = minimal().build().unwrap();
        let shop = ShopDomain::new("my-store").unwrap();
        assert_eq!(config.admin_origin(&shop), "https://my-store.myshopify.com");
    }

    #[test]
    fn test_admin_origin_override_wins() {
        let config = minimal()
            .admin_origin_override(HostUrl::new("http://127.0.0.1:9999/").unwrap())
            .build()
            .unwrap();
        let shop = ShopDomain::new("my-store").unwrap();
        assert_eq!(config.admin_origin(&shop), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_config_is_clone_and_debug_hides_secret() {
        let config = minimal().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.api_key(), config.api_key());

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("ShopifyConfig"));
        assert!(!debug_str.contains("\"secret\""));
    }
}
