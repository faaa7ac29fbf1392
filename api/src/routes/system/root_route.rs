//! GET /: service banner.

use axum::response::Response;
use serde::Serialize;

use crate::core::http::response_envelope::ok;

#[derive(Serialize)]
pub struct Banner {
    pub service: &'static str,
    pub version: &'static str,
    pub routes: &'static [&'static str],
}

pub const ROUTES: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /health/llm",
    "GET /config",
    "POST /ingestion/upload",
    "POST /ingestion/ingest-text",
    "POST /ingestion/ingest-directory",
    "POST /ingestion/search",
    "GET /ingestion/stats",
    "POST /ingestion/rebuild",
    "POST /ingestion/clear",
    "GET /documents",
    "DELETE /documents/{id}",
    "POST /agent/generate-test-cases",
    "POST /agent/generate-all-test-cases",
    "POST /agent/generate-selenium-script",
    "POST /agent/explain-test-case",
    "POST /test-data/generate",
    "POST /test-data/generate-from-test-cases",
    "POST /test-data/extract-fields",
    "GET /test-data/supported-types",
];

pub async fn root_route() -> Response {
    ok(Banner {
        service: "QA Agent API",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTES,
    })
}
