//! GET /test-data/supported-types

use axum::response::Response;
use qa_agent::DataType;
use serde::Serialize;

use crate::core::http::response_envelope::ok;

#[derive(Serialize)]
pub struct SupportedTypes {
    pub supported_types: Vec<&'static str>,
}

pub async fn supported_types_route() -> Response {
    ok(SupportedTypes {
        supported_types: DataType::ALL.iter().map(|t| t.as_str()).collect(),
    })
}
