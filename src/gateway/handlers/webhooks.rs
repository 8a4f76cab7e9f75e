//! Webhook intake route.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;
use crate::webhooks::{
    DispatchOutcome, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC, HEADER_WEBHOOK_ID,
};

/// `POST <webhooks path>`: verifies and dispatches a delivery.
///
/// The response is held until the handlers finish or the configured timeout
/// elapses. Body size is capped by the router.
///
/// # Errors
///
/// [`GatewayError::Webhook`]: 401 for signature failures, 400 for malformed
/// deliveries, 500 for handler failures and timeouts.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    let request = WebhookRequest::new(
        body.to_vec(),
        header(&headers, HEADER_HMAC).unwrap_or_default(),
        header(&headers, HEADER_TOPIC),
        header(&headers, HEADER_SHOP_DOMAIN),
        header(&headers, HEADER_API_VERSION),
        header(&headers, HEADER_WEBHOOK_ID),
    );

    let config = state.config();
    let outcome = state
        .webhooks()
        .process(config.shopify(), &request, config.webhook_handler_timeout())
        .await
        .map_err(|e| {
            tracing::warn!(
                topic = request.topic().unwrap_or("-"),
                shop = request.shop_domain().unwrap_or("-"),
                retryable = e.is_retryable(),
                error = %e,
                "webhook rejected"
            );
            e
        })?;

    if outcome == DispatchOutcome::Unhandled {
        tracing::debug!(topic = request.topic().unwrap_or("-"), "no handler registered");
    }
    Ok(StatusCode::OK)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
