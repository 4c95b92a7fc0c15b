//! Web server setup and routing

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;
use crate::classifier::InferenceClient;
use crate::cli::UiConfig;

/// Build the router over `state`
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // HTML page and form actions
        .route("/", get(handlers::index))
        .route("/select", post(handlers::select_image))
        .route("/analyze", post(handlers::analyze))
        .route("/reset", post(handlers::reset))
        .route("/preview/:id", get(handlers::preview))
        // API endpoints
        .route("/api/state", get(handlers::api_state))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web UI server
pub async fn start_server(config: &UiConfig, client: InferenceClient) -> anyhow::Result<()> {
    info!("Inference service: {}", client.base_url());
    let state = AppState::new(client);
    let app = build_router(state, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting web UI server on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, stopping web UI server");
        })
        .await?;

    Ok(())
}
