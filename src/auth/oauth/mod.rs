//! OAuth authorization-code flow and session-token verification.
//!
//! - [`begin_auth`] builds the authorize redirect and a fresh [`StateParam`].
//! - [`validate_auth_callback`] verifies the callback and exchanges the code
//!   for a [`Session`](crate::Session).
//! - [`JwtPayload::decode`] verifies the bearer session tokens embedded apps
//!   send on API calls.
//! - [`hmac`] holds the signing primitives shared with webhook verification
//!   and the gateway's signed cookies.
//!
//! ```rust,ignore
//! let begin = begin_auth(&config, &shop, "/api/auth/callback", false, None)?;
//! // redirect to begin.auth_url, remember begin.state
//!
//! let session = validate_auth_callback(&config, &http, &query, stored_state).await?;
//! store.store_session(session).await?;
//! ```

mod auth_query;
mod begin_auth;
mod error;
pub mod hmac;
mod jwt_payload;
mod state;
mod validate_callback;

pub use auth_query::AuthQuery;
pub use begin_auth::{begin_auth, BeginAuthResult};
pub use error::OAuthError;
pub use hmac::{compute_signature, constant_time_compare, validate_hmac};
pub use jwt_payload::JwtPayload;
pub use state::StateParam;
pub use validate_callback::validate_auth_callback;
