use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::ingestion::ingestion_request::IngestTextRequest,
};

/// POST /ingestion/ingest-text
#[instrument(name = "ingest_text_route", skip_all, fields(chars = body.text.chars().count()))]
pub async fn ingest_text_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<IngestTextRequest>,
) -> AppResult<Response> {
    let report = state
        .store
        .ingest_text(&body.text, body.source_name.as_deref())
        .await?;
    info!(
        request_id = %request_id(&headers),
        document_id = %report.document.id,
        unchanged = report.unchanged,
        "text ingested"
    );
    Ok(ok(report))
}
