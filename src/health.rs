//! Health-check HTTP listener for hosting platforms that probe a port.

use axum::Json;
use axum::Router;
use axum::routing::get;

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the health routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

/// Serve the health routes on `0.0.0.0:port` until the process exits.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Health listener started");
    axum::serve(listener, health_routes()).await
}
