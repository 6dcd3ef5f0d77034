//! Liveness endpoint.

use axum::{routing::get, Router};
use tracing::info;

pub fn router() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

async fn root_handler() -> &'static str {
    "Bot is running."
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Bind the liveness endpoint and serve it in the background.
pub async fn start_health_server(port: u16) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Liveness endpoint listening on http://0.0.0.0:{}", port);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            tracing::error!("Liveness endpoint error: {}", e);
        }
    });

    Ok(())
}
