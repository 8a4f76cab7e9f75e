use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use storefront_gateway::auth::MemorySessionStore;
use storefront_gateway::config::AppConfig;
use storefront_gateway::gateway::{serve, AppState};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present; production uses real env vars
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        port = config.port(),
        environment = ?config.environment(),
        api_version = %config.shopify().api_version(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let state = AppState::new(config, Arc::new(MemorySessionStore::new()), http);
    serve(state).await.context("server error")?;
    Ok(())
}
