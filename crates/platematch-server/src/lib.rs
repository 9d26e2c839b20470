//! Platematch realtime server.
//!
//! Thin transport shell around the coordination engine in
//! `platematch-core`: an axum WebSocket endpoint plus a health check.
//! Clients authenticate with a bearer token in the upgrade query string
//! and may name a group to join at connect time; everything after that is
//! `{type, data}` frames in both directions.

pub mod auth;
pub mod config;
pub mod state;
pub mod ws;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use state::AppState;

/// Build the axum router with the realtime and health routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health_check))
        .layer(ServiceBuilder::new().concurrency_limit(1024).layer(cors))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Realtime server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
