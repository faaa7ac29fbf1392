use std::sync::Arc;

use axum::{extract::State, response::Response};

use crate::core::{app_state::AppState, http::response_envelope::ok};

/// GET /ingestion/stats
pub async fn stats_route(State(state): State<Arc<AppState>>) -> Response {
    ok(state.store.stats().await)
}
