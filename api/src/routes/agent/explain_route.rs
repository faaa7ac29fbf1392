use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{debug, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::agent::agent_request::ExplainRequest,
};

/// POST /agent/explain-test-case
#[instrument(name = "explain_route", skip_all)]
pub async fn explain_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ExplainRequest>,
) -> AppResult<Response> {
    let out = state.agent.explain_test_case(&body.test_case).await?;
    debug!(request_id = %request_id(&headers), chars = out.explanation.len(), "explanation ready");
    Ok(ok(out))
}
