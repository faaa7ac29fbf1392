//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for doc-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// File extension is not one of the supported document formats.
    #[error("unsupported document format: '{0}'")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured size limit.
    #[error("file too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// Text could not be extracted from a supported format.
    #[error("failed to extract text from '{filename}': {reason}")]
    Extraction { filename: String, reason: String },

    /// Extraction succeeded but produced no text.
    #[error("document '{0}' contains no extractable text")]
    EmptyDocument(String),

    /// Embedding backend failed.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Persisted index is missing, corrupted, or inconsistent with the catalog.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Unknown document id or path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<ai_llm_service::AiLlmError> for StoreError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        StoreError::Embedding(err.to_string())
    }
}

impl StoreError {
    /// Embedding-related failures (backend errors and dimension mismatches).
    pub fn is_embedding_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Embedding(_) | StoreError::VectorSizeMismatch { .. }
        )
    }

    /// Problems with one input file that leave the store untouched.
    pub fn is_file_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedFormat(_)
                | StoreError::FileTooLarge { .. }
                | StoreError::Extraction { .. }
                | StoreError::EmptyDocument(_)
                | StoreError::InvalidInput(_)
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
