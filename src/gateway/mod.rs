//! The authenticated request gateway.
//!
//! [`build_router`] composes the whole HTTP surface from an [`AppState`]:
//! OAuth routes, webhook intake, public API routes, the session guard
//! ([`validate_session`]) over the protected API, static assets and the
//! installation gate ([`install_gate`]) for every other page.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_gateway::auth::MemorySessionStore;
//! use storefront_gateway::config::AppConfig;
//! use storefront_gateway::gateway::{serve, AppState};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let state = AppState::new(config, Arc::new(MemorySessionStore::new()), reqwest::Client::new());
//! serve(state).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod cookies;
mod error;
pub mod handlers;
mod install_gate;
mod middleware;
mod router;
mod server;
mod state;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub use context::{
    query_shop, resolve_context, ContextError, ContextSource, RequestKind, ShopContext,
};
pub use cookies::{
    extract_cookie_value, read_signed_cookie, signed_cookie, SignedCookie, SESSION_COOKIE,
    STATE_COOKIE,
};
pub use error::{GatewayError, Reauthorize, REAUTHORIZE_HEADER, REAUTHORIZE_URL_HEADER};
pub use install_gate::{
    install_gate, installation_state, shop_session, InstallationState, SHELL_FILE,
};
pub use middleware::validate_session;
pub use router::build_router;
pub use server::serve;
pub use state::AppState;

/// A `302 Found` redirect to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
