use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::ingestion::ingestion_request::IngestDirectoryRequest,
};

/// POST /ingestion/ingest-directory: ingests files from a server-side directory.
#[instrument(name = "ingest_directory_route", skip_all, fields(path = %body.path, recursive = body.recursive))]
pub async fn ingest_directory_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<IngestDirectoryRequest>,
) -> AppResult<Response> {
    let report = state.store.ingest_directory(&body.path, body.recursive).await?;
    info!(
        request_id = %request_id(&headers),
        ingested = report.ingested.len(),
        rejected = report.rejected.len(),
        skipped = report.skipped,
        "directory ingested"
    );
    Ok(ok(report))
}
