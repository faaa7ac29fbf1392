use std::sync::Arc;

use ai_llm_service::LlmClient;
use chrono::{DateTime, Utc};
use doc_store::{DocStore, StoreConfig};
use qa_agent::{AgentConfig, QaAgent};
use serde::Serialize;
use tracing::info;

use crate::error_handler::AppResult;

/// HTTP-layer settings.
#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    /// Listen address, e.g. "0.0.0.0:8000".
    pub api_address: String,
}

impl AppConfig {
    /// `API_ADDRESS` (default `0.0.0.0:8000`).
    pub fn from_env() -> Self {
        Self {
            api_address: std::env::var("API_ADDRESS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "0.0.0.0:8000".into()),
        }
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<DocStore>,
    pub llm: Arc<LlmClient>,
    pub agent: Arc<QaAgent>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<DocStore>, llm: Arc<LlmClient>, agent: Arc<QaAgent>) -> Self {
        Self {
            config,
            store,
            llm,
            agent,
            started_at: Utc::now(),
        }
    }

    /// Builds the full pipeline from environment variables.
    ///
    /// Missing LLM credentials or invalid store settings are fatal here. A missing or
    /// corrupt persisted index is not: the store rebuilds it from the uploads.
    pub async fn from_env() -> AppResult<Self> {
        let config = AppConfig::from_env();
        let llm = Arc::new(LlmClient::from_env()?);
        let store_cfg = StoreConfig::from_env()?;
        let provider = doc_store::provider_for(&store_cfg, &llm)?;
        let store = Arc::new(DocStore::open(store_cfg, provider).await?);
        let agent = Arc::new(QaAgent::new(AgentConfig::from_env()?, Arc::clone(&store), llm.clone()));

        let (generation, embedding) = llm.profiles();
        info!(
            address = %config.api_address,
            provider = ?generation.provider,
            model = %generation.model,
            embedding_model = embedding.map(|e| e.model.as_str()).unwrap_or("-"),
            embedder = %store.embedder_name(),
            "application state ready"
        );
        Ok(Self::new(config, store, llm, agent))
    }
}
