use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
    routes::test_data::test_data_request::ExtractFieldsRequest,
};

/// POST /test-data/extract-fields
///
/// `data.origin` is `model`, or `keyword_fallback` when the model answer was unusable
/// or the model was unreachable.
#[instrument(name = "extract_fields_route", skip_all)]
pub async fn extract_fields_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ExtractFieldsRequest>,
) -> AppResult<Response> {
    let out = state.agent.extract_fields(&body.test_case).await?;
    info!(request_id = %request_id(&headers), origin = ?out.origin, fields = out.count, "fields extracted");
    Ok(ok(out))
}
