//! OAuth scope sets.
//!
//! The gateway compares the scopes a session was granted against the scopes
//! the app is configured to require. A session that no longer covers the
//! configured set is treated as invalid, which sends the merchant back
//! through OAuth after the app adds a scope.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes with implied scopes expanded.
///
/// `write_x` implies `read_x`, and `unauthenticated_write_x` implies
/// `unauthenticated_read_x`. Serializes as a sorted comma-separated string.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::AuthScopes;
///
/// let granted: AuthScopes = "write_products, read_orders".parse().unwrap();
/// let required: AuthScopes = "read_products".parse().unwrap();
///
/// assert!(granted.covers(&required));
/// assert_eq!(granted.to_string(), "read_orders,read_products,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: HashSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if `scope` is granted, directly or by implication.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Returns `true` if every scope in `other` is present in `self`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.is_subset(&self.scopes)
    }

    /// Returns an iterator over the scopes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut scopes: HashSet<String> = names
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let implied: Vec<String> = scopes.iter().filter_map(|s| implied_scope(s)).collect();
        scopes.extend(implied);

        Self { scopes }
    }
}

fn implied_scope(scope: &str) -> Option<String> {
    scope
        .strip_prefix("unauthenticated_write_")
        .map(|rest| format!("unauthenticated_read_{rest}"))
        .or_else(|| scope.strip_prefix("write_").map(|rest| format!("read_{rest}")))
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(bad) = s
            .split(',')
            .map(str::trim)
            .find(|scope| !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(ConfigError::InvalidScopes {
                reason: format!("Invalid characters in scope: '{bad}'"),
            });
        }

        Ok(Self::from_names(s.split(',')))
    }
}

impl From<Vec<String>> for AuthScopes {
    fn from(scopes: Vec<String>) -> Self {
        Self::from_names(scopes.iter().map(String::as_str))
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scopes: Vec<&str> = self.iter().collect();
        scopes.sort_unstable();
        f.write_str(&scopes.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_comma_separated_with_whitespace() {
        let scopes: AuthScopes = " read_products , write_orders,,".parse().unwrap();
        assert!(scopes.contains("read_products"));
        assert!(scopes.contains("write_orders"));
        assert!(scopes.contains("read_orders"));
    }

    #[test]
    fn test_write_implies_read() {
        let scopes: AuthScopes = "write_products,unauthenticated_write_checkouts"
            .parse()
            .unwrap();
        assert!(scopes.contains("read_products"));
        assert!(scopes.contains("unauthenticated_read_checkouts"));
        assert!(!scopes.contains("read_unauthenticated_write_checkouts"));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        let result = "read_products,write-orders".parse::<AuthScopes>();
        assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
    }

    #[test]
    fn test_covers_detects_missing_scope() {
        let granted: AuthScopes = "read_products".parse().unwrap();
        let required: AuthScopes = "write_products".parse().unwrap();
        assert!(!granted.covers(&required));
        assert!(required.covers(&granted));
        assert!(granted.covers(&AuthScopes::new()));
    }

    #[test]
    fn test_empty_string_is_empty_set() {
        let scopes: AuthScopes = "".parse().unwrap();
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_serializes_sorted() {
        let scopes = AuthScopes::from(vec!["write_orders".to_string(), "read_all".to_string()]);
        let json = serde_json::to_string(&scopes).unwrap();
        assert_eq!(json, r#""read_all,read_orders,write_orders""#);

        let parsed: AuthScopes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scopes);
    }
}
