//! Outbound HTTP error types.
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::clients::ClientError;
//!
//! let error = ClientError::Response {
//!     code: 404,
//!     message: r#"{"errors":"Not Found"}"#.to_string(),
//!     error_reference: None,
//! };
//! assert_eq!(error.status(), Some(404));
//! ```

use thiserror::Error;

/// Errors from calls to the Admin API or the passthrough upstreams.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream returned {code}: {message}")]
    Response {
        /// HTTP status code.
        code: u16,
        /// Response body, as text.
        message: String,
        /// `X-Request-Id` of the response, if any.
        error_reference: Option<String>,
    },

    /// A GraphQL call returned top-level `errors` or `userErrors`.
    #[error("GraphQL error: {message}")]
    Graphql {
        /// Joined error messages.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// What was missing or malformed.
        message: String,
    },

    /// A passthrough credential is not configured.
    #[error("Missing credential '{name}'")]
    MissingCredential {
        /// Environment variable that would supply it.
        name: &'static str,
    },
}

impl ClientError {
    /// The upstream status code, when there was a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Builds [`ClientError::Response`] from a failed response, consuming it.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let code = response.status().as_u16();
        let error_reference = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let message = response.text().await.unwrap_or_default();
        Self::Response {
            code,
            message,
            error_reference,
        }
    }
}

// Verify ClientError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_message_includes_code() {
        let error = ClientError::Response {
            code: 503,
            message: "maintenance".to_string(),
            error_reference: Some("req-1".to_string()),
        };
        assert_eq!(error.to_string(), "Upstream returned 503: maintenance");
        assert_eq!(error.status(), Some(503));
    }

    #[test]
    fn test_non_response_errors_have_no_status() {
        let error = ClientError::MissingCredential { name: "YOUTUBEAPI" };
        assert_eq!(error.status(), None);
        assert!(error.to_string().contains("YOUTUBEAPI"));
    }
}
