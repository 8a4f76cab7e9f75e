//! JSON API routes.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::Session;
use crate::clients::ClientError;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

/// `GET /api/tester`
pub async fn tester() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Hey! It worked",
    )
}

/// `GET /api/youtube`: relays the latest channel videos.
///
/// # Errors
///
/// [`GatewayError::Upstream`] (502) when the upstream call fails.
pub async fn latest_videos(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.passthrough().latest_videos().await?))
}

/// `GET /api/newsletter/{email}`: relays the subscription result.
///
/// # Errors
///
/// [`GatewayError::Upstream`] (502) when the upstream call fails.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.passthrough().subscribe(&email).await?))
}

/// `GET /api/products/count`
///
/// # Errors
///
/// [`GatewayError::Upstream`] (502) when the Admin API call fails.
pub async fn product_count(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, GatewayError> {
    let count = state.products().product_count(&session).await?;
    Ok(Json(json!({ "count": count })))
}

/// `GET /api/products/create`: always answers `{success, error}`.
pub async fn create_products(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> (StatusCode, Json<Value>) {
    match state.products().create_sample_products(&session).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": true, "error": null }))),
        Err(e) => {
            tracing::error!(shop = %session.shop, error = %e, "sample product creation failed");
            let message = match e {
                ClientError::Graphql { message } => message,
                _ => "Failed to create products".to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": message })),
            )
        }
    }
}

/// Any other `/api/*` path reached with a valid session.
///
/// # Errors
///
/// Always [`GatewayError::NotFound`].
pub async fn not_found() -> Result<(), GatewayError> {
    Err(GatewayError::NotFound)
}
