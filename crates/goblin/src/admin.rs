//! Read-only admin plane: `spec.md` §6's "thin read-views onto core state"
//!
//! No business logic lives here beyond serialization: every handler just
//! projects state already tracked by the pool, registry, and session
//! manager into JSON.

// Layer 1: Standard library imports
use std::time::Instant;

// Layer 2: Third-party crate imports
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

// Layer 3: Internal module imports
use crate::state::AppState;
use goblin_core::backend::BackendState;
use goblin_core::config::AuthMode;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/servers", get(servers))
        .route("/tools", get(tools))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/shutdown", post(shutdown))
}

#[derive(Serialize)]
struct StatusResponse {
    pid: u32,
    uptime_secs: u64,
    mode: &'static str,
    host: String,
    port: u16,
    sessions: usize,
    servers_configured: usize,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.current_snapshot();
    Json(StatusResponse {
        pid: std::process::id(),
        uptime_secs: uptime_secs(state.started_at),
        mode: match snapshot.auth.mode {
            AuthMode::Apikey => "apikey",
            AuthMode::None => "dev",
        },
        host: snapshot.gateway.host.clone(),
        port: snapshot.gateway.port,
        sessions: state.sessions.len(),
        servers_configured: snapshot.servers.len(),
    })
}

#[derive(Serialize)]
struct ServerStatus {
    name: String,
    state: &'static str,
    tool_count: usize,
}

async fn servers(State(state): State<AppState>) -> Json<Vec<ServerStatus>> {
    let registry_snapshot = state.registry.snapshot().await;
    let mut out = Vec::new();
    for name in state.pool.names() {
        let tool_count = registry_snapshot
            .tools
            .iter()
            .filter(|card| card.server_name == name)
            .count();
        let state_label = match state.pool.backend_snapshot(&name).await.map(|b| b.state) {
            Some(BackendState::Disconnected) => "disconnected",
            Some(BackendState::Connecting) => "connecting",
            Some(BackendState::Ready) => "ready",
            Some(BackendState::Degraded) => "degraded",
            Some(BackendState::Failed) => "failed",
            Some(BackendState::Evicted) | None => "evicted",
        };
        out.push(ServerStatus { name, state: state_label, tool_count });
    }
    Json(out)
}

async fn tools(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.registry.snapshot().await;
    Json(snapshot.tools)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

#[derive(Serialize)]
struct MetricsResponse {
    tools: usize,
    prompts: usize,
    resources: usize,
    resource_templates: usize,
    sessions_active: usize,
    backends_configured: usize,
    uptime_secs: u64,
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let snapshot = state.registry.snapshot().await;
    Json(MetricsResponse {
        tools: snapshot.tools.len(),
        prompts: snapshot.prompts.len(),
        resources: snapshot.resources.len(),
        resource_templates: snapshot.resource_templates.len(),
        sessions_active: state.sessions.len(),
        backends_configured: state.pool.names().len(),
        uptime_secs: uptime_secs(state.started_at),
    })
}

async fn shutdown(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.shutdown_tx.send(());
    (StatusCode::ACCEPTED, Json(json!({ "shutting_down": true })))
}

fn uptime_secs(started_at: Instant) -> u64 {
    started_at.elapsed().as_secs()
}
