//! OAuth and session-token errors.

use thiserror::Error;

/// Errors raised by the OAuth begin/callback flow and by session-token
/// decoding.
///
/// Messages may name the failing step but never contain secrets, codes or
/// tokens; the gateway still maps them to generic client responses.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The callback's `hmac` parameter did not verify under any secret.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// The callback's `state` did not match the nonce issued at begin.
    #[error("State parameter mismatch")]
    StateMismatch,

    /// The authorization code could not be exchanged for a token.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// Upstream HTTP status, or 0 when no response was received.
        status: u16,
        /// What went wrong.
        message: String,
    },

    /// The callback query was missing a field or carried an invalid shop.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// Which part of the callback was rejected.
        reason: String,
    },

    /// `begin_auth` needs the app's public host to build the redirect URI.
    #[error("Host URL must be configured in ShopifyConfig for OAuth")]
    MissingHostConfig,

    /// A bearer session token failed signature, time or audience checks.
    #[error("Invalid session token: {reason}")]
    InvalidJwt {
        /// Why the token was rejected.
        reason: String,
    },
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
