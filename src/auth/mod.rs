//! Sessions, scopes, persistence and OAuth.
//!
//! - [`Session`]: an offline (shop-wide) or online (per-user) access token
//! - [`AuthScopes`]: granted or required scopes with implied-scope handling
//! - [`SessionStore`]: async persistence interface, with
//!   [`MemorySessionStore`] as the in-process implementation
//! - [`oauth`]: authorization-code flow and session-token decoding
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::{Session, ShopDomain};
//!
//! let shop = ShopDomain::new("my-store").unwrap();
//! let offline_session = Session::new(
//!     Session::offline_id(&shop),
//!     shop,
//!     "access-token".to_string(),
//!     "read_products".parse().unwrap(),
//!     false,
//!     None,
//! );
//!
//! assert!(!offline_session.expired());
//! ```

pub mod oauth;
mod scopes;
pub mod session;
mod store;

pub use scopes::AuthScopes;
pub use session::{AccessTokenResponse, Session};
pub use store::{MemorySessionStore, SessionStore, StoreError};
