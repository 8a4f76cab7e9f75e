//! Route composition.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::gateway::handlers::{api, oauth, webhooks};
use crate::gateway::install_gate::install_gate;
use crate::gateway::middleware::validate_session;
use crate::gateway::state::AppState;

/// Builds the complete HTTP surface.
///
/// In order of precedence:
///
/// 1. OAuth begin and callback
/// 2. webhook intake, with the configured body limit
/// 3. unauthenticated API routes (`/api/tester`, `/api/youtube`,
///    `/api/newsletter/{email}`)
/// 4. the session guard over
/// 5. the protected API routes and the `/api`, `/api/` and `/api/*`
///    catch-alls
/// 6. static assets from the static root
/// 7. the installation gate for every other page
pub fn build_router(state: AppState) -> Router {
    let config = state.config();

    let public = Router::new()
        .route(config.auth_path(), get(oauth::begin))
        .route(config.auth_callback_path(), get(oauth::callback))
        .route(
            config.webhooks_path(),
            post(webhooks::receive).layer(DefaultBodyLimit::max(config.webhook_max_body_bytes())),
        )
        .route("/api/tester", get(api::tester))
        .route("/api/youtube", get(api::latest_videos))
        .route("/api/newsletter/{email}", get(api::subscribe));

    let protected = Router::new()
        .route("/api/products/count", get(api::product_count))
        .route("/api/products/create", get(api::create_products))
        .route("/api", any(api::not_found))
        .route("/api/", any(api::not_found))
        .route("/api/{*path}", any(api::not_found))
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_session));

    let assets = ServeDir::new(config.static_root())
        .append_index_html_on_directories(false)
        .fallback(get(install_gate).with_state(state.clone()));

    public
        .merge(protected)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
