use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{debug, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::ingestion::{ingestion_request::SearchRequest, ingestion_response::SearchResponse},
};

/// POST /ingestion/search: raw retrieval, useful to debug what the agent will see.
#[instrument(name = "search_route", skip_all, fields(top_k = ?body.top_k))]
pub async fn search_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SearchRequest>,
) -> AppResult<Response> {
    let results = state
        .store
        .retrieve(&body.query, body.top_k, body.document_ids.as_deref())
        .await?;
    debug!(request_id = %request_id(&headers), hits = results.len(), "search finished");
    Ok(ok(SearchResponse {
        query: body.query,
        results,
    }))
}
