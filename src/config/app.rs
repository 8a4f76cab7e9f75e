//! Process-level settings loaded from the environment.

use super::{ApiKey, ApiSecretKey, ApiVersion, HostUrl, ShopifyConfig};
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_AUTH_PATH: &str = "/api/auth";
const DEFAULT_AUTH_CALLBACK_PATH: &str = "/api/auth/callback";
const DEFAULT_WEBHOOKS_PATH: &str = "/api/webhooks";
const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WEBHOOK_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Which asset directory the process serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// `NODE_ENV=production`: serve the built bundle from `frontend/dist`.
    Production,
    /// Anything else: serve the source tree from `frontend/`.
    #[default]
    Development,
}

impl RuntimeEnvironment {
    fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Returns the static root for this environment under `base`.
    #[must_use]
    pub fn static_root(self, base: &Path) -> PathBuf {
        match self {
            Self::Production => base.join("frontend").join("dist"),
            Self::Development => base.join("frontend"),
        }
    }
}

/// Credentials and endpoints for the unauthenticated passthrough routes.
///
/// Missing credentials are not a start-up error; the affected route
/// answers 502 instead.
#[derive(Clone, Debug)]
pub struct PassthroughSettings {
    /// Video search API key (`YOUTUBEAPI`).
    pub video_api_key: Option<String>,
    /// Channel whose uploads are listed (`YOUTUBECHANNEL`).
    pub video_channel_id: Option<String>,
    /// Newsletter list id (`KLAVIYOLIST`).
    pub newsletter_list_id: Option<String>,
    /// Newsletter API key (`KLAVIYOAPI`).
    pub newsletter_api_key: Option<String>,
    /// Base URL of the video search API.
    pub video_base_url: String,
    /// Base URL of the newsletter API.
    pub newsletter_base_url: String,
}

impl Default for PassthroughSettings {
    fn default() -> Self {
        Self {
            video_api_key: None,
            video_channel_id: None,
            newsletter_list_id: None,
            newsletter_api_key: None,
            video_base_url: "https://www.googleapis.com".to_string(),
            newsletter_base_url: "https://a.klaviyo.com".to_string(),
        }
    }
}

/// Everything the server needs to start.
///
/// Built once at start-up and shared read-only with every request.
#[derive(Clone, Debug)]
pub struct AppConfig {
    shopify: ShopifyConfig,
    port: u16,
    environment: RuntimeEnvironment,
    static_root: PathBuf,
    auth_path: String,
    auth_callback_path: String,
    webhooks_path: String,
    use_online_tokens: bool,
    webhook_handler_timeout: Duration,
    webhook_max_body_bytes: usize,
    passthrough: PassthroughSettings,
}

/// Raw variables as read by the `config` environment source. Keys arrive
/// lowercased.
#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    backend_port: Option<String>,
    port: Option<String>,
    node_env: Option<String>,
    host: Option<String>,
    shopify_app_url: Option<String>,
    shopify_api_key: Option<String>,
    shopify_api_secret: Option<String>,
    shopify_old_api_secret: Option<String>,
    shopify_api_version: Option<String>,
    shopify_embedded: Option<String>,
    shopify_use_online_tokens: Option<String>,
    scopes: Option<String>,
    webhook_handler_timeout_secs: Option<String>,
    webhook_max_body_bytes: Option<String>,
    youtubeapi: Option<String>,
    youtubechannel: Option<String>,
    klaviyolist: Option<String>,
    klaviyoapi: Option<String>,
}

impl AppConfig {
    /// Starts a builder around an already-built platform configuration.
    #[must_use]
    pub fn builder(shopify: ShopifyConfig) -> AppConfigBuilder {
        AppConfigBuilder::new(shopify)
    }

    /// Loads the configuration from the process environment, resolving the
    /// static root against the current working directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Environment {
            reason: format!("cannot resolve working directory: {e}"),
        })?;
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(vars, &cwd)
    }

    /// Loads the configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_vars<I>(vars: I, base_dir: &Path) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let source: config::Map<String, String> = vars.into_iter().collect();
        let env: EnvSettings = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .source(Some(source))
                    .ignore_empty(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<EnvSettings>())
            .map_err(|e| ConfigError::Environment {
                reason: e.to_string(),
            })?;

        let mut shopify = ShopifyConfig::builder()
            .api_key(ApiKey::new(required(env.shopify_api_key, "SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(required(
                env.shopify_api_secret,
                "SHOPIFY_API_SECRET",
            )?)?)
            .is_embedded(parse_flag(env.shopify_embedded.as_deref(), "SHOPIFY_EMBEDDED", true)?);

        if let Some(old) = env.shopify_old_api_secret {
            shopify = shopify.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(scopes) = env.scopes {
            shopify = shopify.scopes(scopes.parse()?);
        }
        if let Some(host) = env.shopify_app_url.or(env.host) {
            shopify = shopify.host(HostUrl::new(host)?);
        }
        if let Some(version) = env.shopify_api_version {
            shopify = shopify.api_version(version.parse::<ApiVersion>()?);
        }

        let environment = RuntimeEnvironment::from_node_env(env.node_env.as_deref());
        let mut builder = Self::builder(shopify.build()?)
            .environment(environment)
            .static_root(environment.static_root(base_dir))
            .use_online_tokens(parse_flag(
                env.shopify_use_online_tokens.as_deref(),
                "SHOPIFY_USE_ONLINE_TOKENS",
                false,
            )?)
            .passthrough(PassthroughSettings {
                video_api_key: env.youtubeapi,
                video_channel_id: env.youtubechannel,
                newsletter_list_id: env.klaviyolist,
                newsletter_api_key: env.klaviyoapi,
                ..PassthroughSettings::default()
            });

        if let Some(port) = env.backend_port.or(env.port) {
            builder = builder.port(parse_number(&port, "PORT")?);
        }
        if let Some(secs) = env.webhook_handler_timeout_secs {
            let secs: u64 = parse_number(&secs, "WEBHOOK_HANDLER_TIMEOUT_SECS")?;
            builder = builder.webhook_handler_timeout(Duration::from_secs(secs));
        }
        if let Some(bytes) = env.webhook_max_body_bytes {
            builder = builder.webhook_max_body_bytes(parse_number(&bytes, "WEBHOOK_MAX_BODY_BYTES")?);
        }

        builder.build()
    }

    /// Returns the platform configuration.
    #[must_use]
    pub const fn shopify(&self) -> &ShopifyConfig {
        &self.shopify
    }

    /// Returns the listening port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the runtime environment.
    #[must_use]
    pub const fn environment(&self) -> RuntimeEnvironment {
        self.environment
    }

    /// Returns the directory static assets and `index.html` are served from.
    #[must_use]
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// Path of the OAuth begin route.
    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }

    /// Path of the OAuth callback route.
    #[must_use]
    pub fn auth_callback_path(&self) -> &str {
        &self.auth_callback_path
    }

    /// Path of the webhook route.
    #[must_use]
    pub fn webhooks_path(&self) -> &str {
        &self.webhooks_path
    }

    /// Whether the OAuth begin route requests online (per-user) tokens.
    #[must_use]
    pub const fn use_online_tokens(&self) -> bool {
        self.use_online_tokens
    }

    /// Upper bound on a whole webhook dispatch.
    #[must_use]
    pub const fn webhook_handler_timeout(&self) -> Duration {
        self.webhook_handler_timeout
    }

    /// Largest webhook body accepted before answering 413.
    #[must_use]
    pub const fn webhook_max_body_bytes(&self) -> usize {
        self.webhook_max_body_bytes
    }

    /// Returns the passthrough route settings.
    #[must_use]
    pub const fn passthrough(&self) -> &PassthroughSettings {
        &self.passthrough
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::MissingRequiredField { field })
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Environment {
        reason: format!("{name} must be a number, got '{value}'"),
    })
}

fn parse_flag(value: Option<&str>, name: &str, default: bool) -> Result<bool, ConfigError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Environment {
            reason: format!("{name} must be true or false, got '{other}'"),
        }),
    }
}

/// Builder for [`AppConfig`]; every field but the platform configuration
/// has a default.
#[derive(Debug)]
pub struct AppConfigBuilder {
    shopify: ShopifyConfig,
    port: u16,
    environment: RuntimeEnvironment,
    static_root: Option<PathBuf>,
    auth_path: String,
    auth_callback_path: String,
    webhooks_path: String,
    use_online_tokens: bool,
    webhook_handler_timeout: Duration,
    webhook_max_body_bytes: usize,
    passthrough: PassthroughSettings,
}

impl AppConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(shopify: ShopifyConfig) -> Self {
        Self {
            shopify,
            port: DEFAULT_PORT,
            environment: RuntimeEnvironment::default(),
            static_root: None,
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            auth_callback_path: DEFAULT_AUTH_CALLBACK_PATH.to_string(),
            webhooks_path: DEFAULT_WEBHOOKS_PATH.to_string(),
            use_online_tokens: false,
            webhook_handler_timeout: DEFAULT_WEBHOOK_TIMEOUT,
            webhook_max_body_bytes: DEFAULT_WEBHOOK_MAX_BODY_BYTES,
            passthrough: PassthroughSettings::default(),
        }
    }

    /// Sets the listening port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the runtime environment.
    #[must_use]
    pub const fn environment(mut self, environment: RuntimeEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the static root directly.
    #[must_use]
    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = Some(root.into());
        self
    }

    /// Sets the OAuth begin path.
    #[must_use]
    pub fn auth_path(mut self, path: impl Into<String>) -> Self {
        self.auth_path = path.into();
        self
    }

    /// Sets the OAuth callback path.
    #[must_use]
    pub fn auth_callback_path(mut self, path: impl Into<String>) -> Self {
        self.auth_callback_path = path.into();
        self
    }

    /// Sets the webhook path.
    #[must_use]
    pub fn webhooks_path(mut self, path: impl Into<String>) -> Self {
        self.webhooks_path = path.into();
        self
    }

    /// Requests online tokens from the OAuth begin route.
    #[must_use]
    pub const fn use_online_tokens(mut self, online: bool) -> Self {
        self.use_online_tokens = online;
        self
    }

    /// Sets the webhook dispatch timeout.
    #[must_use]
    pub const fn webhook_handler_timeout(mut self, timeout: Duration) -> Self {
        self.webhook_handler_timeout = timeout;
        self
    }

    /// Sets the webhook body limit.
    #[must_use]
    pub const fn webhook_max_body_bytes(mut self, bytes: usize) -> Self {
        self.webhook_max_body_bytes = bytes;
        self
    }

    /// Sets the passthrough settings.
    #[must_use]
    pub fn passthrough(mut self, settings: PassthroughSettings) -> Self {
        self.passthrough = settings;
        self
    }

    /// Builds the [`AppConfig`].
    ///
    /// When no static root was set, it is derived from the environment
    /// relative to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRoutePath`] if a route path does not
    /// start with `/`, or [`ConfigError::Environment`] if the body limit or
    /// timeout is zero.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        for path in [&self.auth_path, &self.auth_callback_path, &self.webhooks_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidRoutePath { path: path.clone() });
            }
        }
        if self.webhook_max_body_bytes == 0 || self.webhook_handler_timeout.is_zero() {
            return Err(ConfigError::Environment {
                reason: "webhook body limit and handler timeout must be non-zero".to_string(),
            });
        }

        let static_root = self
            .static_root
            .unwrap_or_else(|| self.environment.static_root(Path::new(".")));

        Ok(AppConfig {
            shopify: self.shopify,
            port: self.port,
            environment: self.environment,
            static_root,
            auth_path: self.auth_path,
            auth_callback_path: self.auth_callback_path,
            webhooks_path: self.webhooks_path,
            use_online_tokens: self.use_online_tokens,
            webhook_handler_timeout: self.webhook_handler_timeout,
            webhook_max_body_bytes: self.webhook_max_body_bytes,
            passthrough: self.passthrough,
        })
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SHOPIFY_API_KEY", "key"),
            ("SHOPIFY_API_SECRET", "secret"),
        ]
    }

    #[test]
    fn test_from_vars_applies_defaults() {
        let config = AppConfig::from_vars(vars(&base_vars()), Path::new("/srv/app")).unwrap();

        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.environment(), RuntimeEnvironment::Development);
        assert_eq!(config.static_root(), Path::new("/srv/app/frontend"));
        assert_eq!(config.auth_path(), "/api/auth");
        assert_eq!(config.auth_callback_path(), "/api/auth/callback");
        assert_eq!(config.webhooks_path(), "/api/webhooks");
        assert_eq!(config.webhook_handler_timeout(), Duration::from_secs(10));
        assert_eq!(config.webhook_max_body_bytes(), 1024 * 1024);
        assert!(config.shopify().is_embedded());
        assert!(!config.use_online_tokens());
    }

    #[test]
    fn test_production_serves_built_bundle() {
        let mut pairs = base_vars();
        pairs.push(("NODE_ENV", "production"));
        let config = AppConfig::from_vars(vars(&pairs), Path::new("/srv/app")).unwrap();

        assert_eq!(config.environment(), RuntimeEnvironment::Production);
        assert_eq!(config.static_root(), Path::new("/srv/app/frontend/dist"));
    }

    #[test]
    fn test_backend_port_takes_precedence_over_port() {
        let mut pairs = base_vars();
        pairs.push(("PORT", "3000"));
        pairs.push(("BACKEND_PORT", "4000"));
        let config = AppConfig::from_vars(vars(&pairs), Path::new(".")).unwrap();
        assert_eq!(config.port(), 4000);
    }

    #[test]
    fn test_reads_platform_and_limit_settings() {
        let mut pairs = base_vars();
        pairs.extend([
            ("SHOPIFY_OLD_API_SECRET", "previous"),
            ("SCOPES", "write_products"),
            ("SHOPIFY_APP_URL", "https://app.example.com"),
            ("SHOPIFY_EMBEDDED", "false"),
            ("WEBHOOK_HANDLER_TIMEOUT_SECS", "3"),
            ("WEBHOOK_MAX_BODY_BYTES", "2048"),
            ("YOUTUBEAPI", "yt-key"),
            ("KLAVIYOLIST", "list-1"),
        ]);
        let config = AppConfig::from_vars(vars(&pairs), Path::new(".")).unwrap();

        let shopify = config.shopify();
        assert_eq!(shopify.old_api_secret_key().unwrap().as_ref(), "previous");
        assert!(shopify.scopes().contains("read_products"));
        assert_eq!(shopify.host().unwrap().as_ref(), "https://app.example.com");
        assert!(!shopify.is_embedded());
        assert_eq!(config.webhook_handler_timeout(), Duration::from_secs(3));
        assert_eq!(config.webhook_max_body_bytes(), 2048);
        assert_eq!(config.passthrough().video_api_key.as_deref(), Some("yt-key"));
        assert_eq!(config.passthrough().newsletter_list_id.as_deref(), Some("list-1"));
        assert!(config.passthrough().newsletter_api_key.is_none());
    }

    #[test]
    fn test_missing_api_key_is_reported_by_variable_name() {
        let result = AppConfig::from_vars(vars(&[("SHOPIFY_API_SECRET", "s")]), Path::new("."));
        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "SHOPIFY_API_KEY"
            })
        ));
    }

    #[test]
    fn test_malformed_numbers_and_flags_fail_fast() {
        let mut pairs = base_vars();
        pairs.push(("PORT", "eighty"));
        assert!(matches!(
            AppConfig::from_vars(vars(&pairs), Path::new(".")),
            Err(ConfigError::Environment { .. })
        ));

        let mut pairs = base_vars();
        pairs.push(("SHOPIFY_EMBEDDED", "maybe"));
        assert!(matches!(
            AppConfig::from_vars(vars(&pairs), Path::new(".")),
            Err(ConfigError::Environment { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_relative_route_paths() {
        let shopify = ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap();

        let result = AppConfig::builder(shopify).webhooks_path("api/webhooks").build();
        assert!(matches!(result, Err(ConfigError::InvalidRoutePath { .. })));
    }

    #[test]
    fn test_builder_rejects_zero_body_limit() {
        let shopify = ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap();

        let result = AppConfig::builder(shopify).webhook_max_body_bytes(0).build();
        assert!(result.is_err());
    }
}
