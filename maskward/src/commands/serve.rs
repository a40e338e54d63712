// maskward/src/commands/serve.rs
//
// USE CASE: HTTP trigger. POST /run performs a request-style run.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tokio::sync::Mutex;
use tracing::info;

use maskward_core::application::handle_request;

use crate::commands::Workspace;

pub struct AppState {
    pub workspace: Workspace,
    /// One run at a time.
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            run_lock: Mutex::new(()),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/run", post(handle_run))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// POST /run -- outcome status code, plain-text message
async fn handle_run(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    let _guard = state.run_lock.lock().await;
    let outcome = handle_request(&state.workspace.services, &state.workspace.config).await;

    let status =
        StatusCode::from_u16(outcome.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, outcome.message().to_string())
}

/// GET /health
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = &state.workspace.config;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "project_id": config.project_id,
        "dataset_id": config.dataset_id,
        "engine": state.workspace.services.warehouse.engine_name(),
    }))
}

pub async fn execute(workspace: Workspace, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let app = build_router(Arc::new(AppState::new(workspace)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "HTTP trigger listening");
    println!("🌐 Listening on http://{} (POST /run, GET /health)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
