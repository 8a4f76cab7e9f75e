//! # Storefront Gateway
//!
//! The authenticated request layer of a Shopify storefront app: session
//! validation, webhook verification and dispatch, and the installation gate
//! in front of the app shell.
//!
//! ## Overview
//!
//! - [`config`]: [`ShopifyConfig`] with validated newtypes, and
//!   [`config::AppConfig`] loaded from the environment
//! - [`auth`]: [`Session`], [`AuthScopes`], the [`SessionStore`] interface
//!   and the OAuth primitives in [`auth::oauth`]
//! - [`webhooks`]: signature verification and the topic-to-handler registry
//! - [`clients`]: outbound Admin API and passthrough calls
//! - [`gateway`]: the axum router, middleware and handlers
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_gateway::{ApiKey, ApiSecretKey, ApiVersion, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .scopes("read_products,write_products".parse().unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//! assert!(config.scopes().contains("write_products"));
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_gateway::auth::MemorySessionStore;
//! use storefront_gateway::config::AppConfig;
//! use storefront_gateway::gateway::{build_router, AppState};
//!
//! let config = AppConfig::from_env().unwrap();
//! let state = AppState::new(config, Arc::new(MemorySessionStore::new()), reqwest::Client::new());
//! let router = build_router(state);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration and the handler registry are built
//!   once and shared by reference
//! - **Fail-fast validation**: newtypes validate on construction
//! - **Thread-safe**: shared types are `Send + Sync`
//! - **Verify before parse**: webhook bodies are authenticated as raw bytes

use std::future::Future;
use std::pin::Pin;

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod webhooks;

/// A boxed, sendable future, used by the object-safe async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export public types at crate root for convenience
pub use auth::{AuthScopes, MemorySessionStore, Session, SessionStore, StoreError};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, AppConfig, HostUrl, ShopDomain, ShopifyConfig,
    ShopifyConfigBuilder,
};
pub use error::ConfigError;

// Re-export OAuth types for convenience
pub use auth::oauth::{begin_auth, validate_auth_callback, AuthQuery, BeginAuthResult, OAuthError, StateParam};
