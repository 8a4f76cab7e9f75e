//! OAuth state nonces.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// The `state` value sent to the authorize endpoint and echoed back on the
/// callback.
///
/// The gateway stores it in a signed cookie at begin and compares it in
/// constant time at the callback.
///
/// ```rust
/// use storefront_gateway::auth::oauth::StateParam;
///
/// let state = StateParam::new();
/// assert_eq!(state.as_ref().len(), 15);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    const NONCE_LENGTH: usize = 15;

    /// Generates a fresh alphanumeric nonce from the thread RNG.
    #[must_use]
    pub fn new() -> Self {
        let value: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();

        Self { value }
    }

    /// Wraps a state value received from a callback or cookie.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_15_char_alphanumeric_nonce() {
        let state = StateParam::new();
        assert_eq!(state.as_ref().len(), 15);
        assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_nonces_are_unique() {
        let a = StateParam::new();
        let b = StateParam::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_raw_preserves_value() {
        let state = StateParam::from_raw("echoed-state");
        assert_eq!(state.to_string(), "echoed-state");
    }
}
