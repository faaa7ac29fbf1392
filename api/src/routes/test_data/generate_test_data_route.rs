//! POST /test-data/generate

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use qa_agent::TestDataRequest;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
};

/// Valid, invalid and boundary rows for one test case.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/test-data/generate \
///   -H 'content-type: application/json' \
///   -d '{"test_case":"Login with valid email and password","num_valid":5,"num_invalid":3}'
/// ```
#[instrument(name = "generate_test_data_route", skip_all, fields(num_valid = body.num_valid, num_invalid = body.num_invalid))]
pub async fn generate_test_data_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TestDataRequest>,
) -> AppResult<Response> {
    let out = state.agent.generate_test_data(&body).await?;
    info!(
        request_id = %request_id(&headers),
        fields = out.dataset.summary.total_fields,
        valid = out.dataset.summary.total_valid,
        invalid = out.dataset.summary.total_invalid,
        "test data generated"
    );
    Ok(ok(out))
}
