use std::sync::Arc;

use ai_llm_service::{UsageStats, health_service::HealthStatus};
use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use crate::core::{
    app_state::AppState,
    http::{request_id::request_id, response_envelope::ok},
};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
}

#[derive(Serialize)]
pub struct LlmHealthResponse {
    pub healthy: bool,
    pub probes: Vec<HealthStatus>,
    pub usage: UsageStats,
}

/// GET /health: liveness only; touches neither the index nor the LLM.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /health/llm: probes the generation (and embedding) providers.
#[instrument(name = "health_llm_route", skip_all)]
pub async fn health_llm_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let probes = state.llm.health_all().await;
    let healthy = probes.iter().all(|p| p.ok);
    info!(request_id = %request_id(&headers), healthy, probes = probes.len(), "llm health checked");
    ok(LlmHealthResponse {
        healthy,
        probes,
        usage: state.llm.usage(),
    })
}
