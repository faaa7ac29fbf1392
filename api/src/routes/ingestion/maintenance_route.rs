//! Index maintenance: rebuild from uploads, clear everything.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{info, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::{AppError, AppResult},
    routes::ingestion::{ingestion_request::ClearRequest, ingestion_response::ClearResponse},
};

/// POST /ingestion/rebuild
#[instrument(name = "rebuild_route", skip_all)]
pub async fn rebuild_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Response> {
    let report = state.store.rebuild().await?;
    info!(
        request_id = %request_id(&headers),
        documents = report.documents,
        chunks = report.chunks,
        failed = report.failed.len(),
        "index rebuilt"
    );
    Ok(ok(report))
}

/// POST /ingestion/clear: requires `{"confirm": true}`.
#[instrument(name = "clear_route", skip_all)]
pub async fn clear_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ClearRequest>,
) -> AppResult<Response> {
    if !body.confirm {
        return Err(AppError::Validation("set \"confirm\": true to clear all documents".into()));
    }
    let removed = state.store.clear().await?;
    warn!(request_id = %request_id(&headers), removed, "all documents cleared");
    Ok(ok(ClearResponse {
        removed_documents: removed,
    }))
}
