use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use qa_agent::TestDataFromCasesRequest;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
};

/// POST /test-data/generate-from-test-cases: one merged dataset over several cases.
#[instrument(name = "generate_from_cases_route", skip_all, fields(cases = body.test_cases.len()))]
pub async fn generate_from_cases_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TestDataFromCasesRequest>,
) -> AppResult<Response> {
    let out = state.agent.generate_test_data_from_cases(&body).await?;
    info!(
        request_id = %request_id(&headers),
        cases = out.dataset.summary.test_cases_processed,
        fields = out.dataset.summary.total_fields,
        "test data generated from cases"
    );
    Ok(ok(out))
}
