//! Typed error for the qa-agent crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed agent settings in the environment.
    #[error("config error: {0}")]
    Config(String),

    /// Request rejected before any retrieval or LLM call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced file (e.g. an HTML page) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Errors from the document store (retrieval, embeddings, index).
    #[error("store error: {0}")]
    Store(#[from] doc_store::StoreError),

    /// Errors from the LLM client (unavailable, provider, config).
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// JSON (de)serialization issues (should be rare).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
