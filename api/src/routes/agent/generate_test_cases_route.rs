//! POST /agent/generate-test-cases

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use qa_agent::TestCaseRequest;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
};

/// Generates test cases for a feature description.
///
/// Unparseable model output is still a `200`: `data.result` is
/// `{"status":"parse_failed","reason":..,"raw":..}`.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/agent/generate-test-cases \
///   -H 'content-type: application/json' \
///   -d '{"feature_description":"Discount code at checkout","top_k":5}'
/// ```
#[instrument(name = "generate_test_cases_route", skip_all)]
pub async fn generate_test_cases_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TestCaseRequest>,
) -> AppResult<Response> {
    let out = state.agent.generate_test_cases(&body).await?;
    info!(
        request_id = %request_id(&headers),
        sources = out.sources.len(),
        parsed = out.result.is_ok(),
        "test cases generated"
    );
    Ok(ok(out))
}
