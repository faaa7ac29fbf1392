//! GET /config: effective, non-secret configuration.

use std::sync::Arc;

use ai_llm_service::LlmModelConfig;
use axum::{extract::State, response::Response};
use doc_store::StoreConfig;
use qa_agent::AgentConfig;
use serde::Serialize;

use crate::core::{
    app_state::{AppConfig, AppState},
    http::response_envelope::ok,
};

#[derive(Serialize)]
pub struct LlmProfileView {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_key_set: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl From<&LlmModelConfig> for LlmProfileView {
    fn from(c: &LlmModelConfig) -> Self {
        Self {
            provider: format!("{:?}", c.provider).to_lowercase(),
            model: c.model.clone(),
            endpoint: c.base_url().to_string(),
            api_key_set: c.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()),
            max_tokens: c.max_tokens,
            temperature: c.temperature,
        }
    }
}

#[derive(Serialize)]
pub struct ConfigResponse<'a> {
    pub api: &'a AppConfig,
    pub store: &'a StoreConfig,
    pub embedder: &'a str,
    pub agent: &'a AgentConfig,
    pub generation: LlmProfileView,
    pub embedding: Option<LlmProfileView>,
}

pub async fn config_route(State(state): State<Arc<AppState>>) -> Response {
    let (generation, embedding) = state.llm.profiles();
    ok(ConfigResponse {
        api: &state.config,
        store: state.store.config(),
        embedder: state.store.embedder_name(),
        agent: state.agent.config(),
        generation: generation.into(),
        embedding: embedding.map(LlmProfileView::from),
    })
}
