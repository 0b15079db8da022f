//! Axum server setup and router configuration.

use crate::api;
use crate::state::AppState;
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Largest webhook body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(api::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Add state to all routes
        .with_state(state)
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> &'static str {
    "OK"
}

/// Run the server until `shutdown` resolves, then finish in-flight requests.
pub async fn run_server(
    router: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
