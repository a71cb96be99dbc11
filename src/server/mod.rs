//! HTTP surface.
//!
//! Routes:
//! - `POST /ingest`: save a URL and analyze it
//! - `POST /analyze`: analyze a saved URL
//! - `GET /urls`, `GET /urls/:id/analyses`: read back saved rows
//! - `GET /health`
//!
//! Every route is CORS-enabled for any origin.

mod handlers;
pub mod types;

use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use handlers::{
    analyze_handler, health_handler, ingest_handler, list_analyses_handler, list_urls_handler,
    preflight_handler,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ingest", post(ingest_handler).options(preflight_handler))
        .route("/analyze", post(analyze_handler).options(preflight_handler))
        .route("/urls", get(list_urls_handler))
        .route("/urls/:id/analyses", get(list_analyses_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
