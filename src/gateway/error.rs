//! Gateway error taxonomy and its HTTP mapping.
//!
//! API consumers get JSON bodies, navigations get redirects. Response
//! bodies never carry internal detail; the full error is logged instead.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::auth::StoreError;
use crate::clients::ClientError;
use crate::gateway::found;
use crate::webhooks::WebhookError;

/// Marks a 401 response as needing re-authorization.
pub const REAUTHORIZE_HEADER: &str = "X-Shopify-API-Request-Failure-Reauthorize";
/// Carries the URL that starts re-authorization.
pub const REAUTHORIZE_URL_HEADER: &str = "X-Shopify-API-Request-Failure-Reauthorize-Url";

/// How an authentication failure should be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reauthorize {
    /// `<auth path>?shop=<shop>`, when the shop is known.
    pub url: Option<String>,
    /// `true` for top-level navigations, which are redirected.
    pub navigation: bool,
}

/// Errors surfaced by gateway routes and middleware.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No session could be found for the request.
    #[error("Authentication required")]
    AuthenticationMissing {
        /// Response shape.
        reauthorize: Reauthorize,
    },

    /// A session token, cookie or session record was rejected.
    #[error("Authentication invalid: {reason}")]
    AuthenticationInvalid {
        /// Logged only.
        reason: String,
        /// Response shape.
        reauthorize: Reauthorize,
    },

    /// The `shop` query parameter was missing or malformed.
    #[error("No shop provided")]
    MissingShop,

    /// The OAuth flow failed.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Webhook verification or dispatch failed.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// The session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An outbound call failed.
    #[error(transparent)]
    Upstream(#[from] ClientError),

    /// The static application shell could not be read.
    #[error("Application shell unavailable: {0}")]
    Shell(#[source] std::io::Error),

    /// No protected route matched.
    #[error("Not found")]
    NotFound,
}

impl GatewayError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthenticationMissing { reauthorize } | Self::AuthenticationInvalid { reauthorize, .. } => {
                if reauthorize.navigation && reauthorize.url.is_some() {
                    StatusCode::FOUND
                } else {
                    StatusCode::UNAUTHORIZED
                }
            }
            Self::MissingShop => StatusCode::BAD_REQUEST,
            Self::OAuth(e) => match e {
                OAuthError::InvalidHmac
                | OAuthError::StateMismatch
                | OAuthError::InvalidCallback { .. }
                | OAuthError::InvalidJwt { .. } => StatusCode::BAD_REQUEST,
                OAuthError::TokenExchangeFailed { .. } => StatusCode::BAD_GATEWAY,
                OAuthError::MissingHostConfig => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Webhook(e) => match e {
                WebhookError::InvalidHmac => StatusCode::UNAUTHORIZED,
                WebhookError::MissingHeader { .. }
                | WebhookError::InvalidShopDomain { .. }
                | WebhookError::PayloadParseError { .. } => StatusCode::BAD_REQUEST,
                WebhookError::HandlerFailed { .. } | WebhookError::Timeout { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Store(_) | Self::Shell(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::AuthenticationMissing { .. } => "Authentication required",
            Self::AuthenticationInvalid { .. } => "Authentication invalid",
            Self::MissingShop => "No shop provided",
            Self::OAuth(OAuthError::TokenExchangeFailed { .. }) => "Token exchange failed",
            Self::OAuth(OAuthError::MissingHostConfig) => "Internal server error",
            Self::OAuth(_) => "Invalid OAuth callback",
            Self::Webhook(WebhookError::InvalidHmac) => "Unauthorized",
            Self::Webhook(WebhookError::HandlerFailed { .. } | WebhookError::Timeout { .. }) => {
                "Webhook processing failed"
            }
            Self::Webhook(_) => "Invalid webhook request",
            Self::Upstream(_) => "upstream request failed",
            Self::Store(_) | Self::Shell(_) => "Internal server error",
            Self::NotFound => "not found",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        match self {
            Self::AuthenticationMissing { reauthorize }
            | Self::AuthenticationInvalid { reauthorize, .. } => {
                unauthorized(reauthorize, status)
            }
            Self::MissingShop => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "No shop provided",
            )
                .into_response(),
            other => (status, Json(json!({ "error": other.public_message() }))).into_response(),
        }
    }
}

fn unauthorized(reauthorize: Reauthorize, status: StatusCode) -> Response {
    if let (StatusCode::FOUND, Some(url)) = (status, reauthorize.url.as_deref()) {
        return found(url);
    }

    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized", "reauthorize_url": reauthorize.url })),
    )
        .into_response();
    let headers = response.headers_mut();
    headers.insert(REAUTHORIZE_HEADER, HeaderValue::from_static("1"));
    if let Some(value) = reauthorize.url.as_deref().and_then(|u| HeaderValue::from_str(u).ok()) {
        headers.insert(REAUTHORIZE_URL_HEADER, value);
    }
    response
}
