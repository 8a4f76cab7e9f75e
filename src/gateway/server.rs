//! Listener start-up and graceful shutdown.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::gateway::router::build_router;
use crate::gateway::state::AppState;

/// Serves the gateway on `0.0.0.0:<port>` until Ctrl-C or SIGTERM.
///
/// In-flight requests finish before this returns.
///
/// # Errors
///
/// Returns `std::io::Error` if the port cannot be bound.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config().port()));
    let static_root = state.config().static_root().display().to_string();
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, static_root = %static_root, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
