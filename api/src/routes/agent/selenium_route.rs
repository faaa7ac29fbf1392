use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use qa_agent::SeleniumRequest;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
};

/// POST /agent/generate-selenium-script
#[instrument(name = "selenium_route", skip_all, fields(cases = body.test_cases.len()))]
pub async fn selenium_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SeleniumRequest>,
) -> AppResult<Response> {
    let out = state.agent.generate_selenium_script(&body).await?;
    info!(
        request_id = %request_id(&headers),
        html_analyzed = out.html_analyzed,
        parsed = out.result.is_ok(),
        "selenium script generated"
    );
    Ok(ok(out))
}
