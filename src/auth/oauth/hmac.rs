//! HMAC-SHA256 signing and verification.
//!
//! Three things in the gateway are signed with the app secret: the OAuth
//! callback query (hex digest), webhook bodies (base64 digest), and the
//! gateway's own cookies (base64 digest). All comparisons are constant-time,
//! and verification tries the old secret after the primary one.
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let signature = compute_signature("code=abc&shop=x.myshopify.com", "secret");
//! assert_eq!(signature.len(), 64);
//!
//! let webhook_sig = compute_signature_base64(b"{}", "secret");
//! assert_eq!(webhook_sig.len(), 44);
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::AuthQuery;
use crate::config::ShopifyConfig;

type HmacSha256 = Hmac<Sha256>;

fn digest(message: &[u8], secret: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Computes a lowercase hex HMAC-SHA256 of `message`.
///
/// Returns an empty string only if the MAC cannot be keyed, and an empty
/// signature never compares equal in [`constant_time_compare`].
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    digest(message.as_bytes(), secret).map(hex::encode).unwrap_or_default()
}

/// Computes a standard-alphabet base64 HMAC-SHA256 of raw bytes.
///
/// Used for webhook bodies, which must be signed exactly as received.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    digest(message, secret)
        .map(|bytes| BASE64_STANDARD.encode(bytes))
        .unwrap_or_default()
}

/// Constant-time string equality. Empty inputs never match.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Returns `true` if `signature` is the base64 HMAC of `message` under any of
/// the configured secrets.
#[must_use]
pub fn verify_base64_signature(message: &[u8], signature: &str, config: &ShopifyConfig) -> bool {
    let signature = signature.trim();
    config
        .secret_keys()
        .any(|key| constant_time_compare(&compute_signature_base64(message, key.as_ref()), signature))
}

/// Validates the `hmac` parameter of an OAuth callback against the other
/// parameters, trying the primary secret and then the old one.
#[must_use]
pub fn validate_hmac(query: &AuthQuery, config: &ShopifyConfig) -> bool {
    let signable = query.to_signable_string();
    config
        .secret_keys()
        .any(|key| constant_time_compare(&compute_signature(&signable, key.as_ref()), &query.hmac))
}

// Internal hex encoding since we don't want to add another dependency
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut result = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
