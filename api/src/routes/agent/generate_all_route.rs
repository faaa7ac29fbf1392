use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::agent::agent_request::GenerateAllRequest,
};

/// POST /agent/generate-all-test-cases: positive and negative cases for a named feature.
#[instrument(name = "generate_all_route", skip_all, fields(feature = %body.feature_name))]
pub async fn generate_all_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateAllRequest>,
) -> AppResult<Response> {
    let out = state
        .agent
        .generate_all_test_cases_for_feature(&body.feature_name)
        .await?;
    info!(request_id = %request_id(&headers), parsed = out.result.is_ok(), "all test cases generated");
    Ok(ok(out))
}
