//! Runtime and storage configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::chunker::ChunkerConfig;
use crate::errors::StoreError;

/// Which embedder backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    /// Local deterministic feature hashing (no network).
    Hash,
    /// Embedding profile of the shared LLM client (Ollama / OpenAI-compatible).
    Remote,
}

/// Configuration for ingestion, chunking, embedding and persistence.
#[derive(Clone, Debug, Serialize)]
pub struct StoreConfig {
    /// Root directory for `index/` and `uploads/`.
    pub storage_dir: PathBuf,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Default number of chunks returned by retrieval.
    pub top_k: usize,
    /// Upload size limit in bytes.
    pub max_upload_bytes: u64,
    pub embedding_kind: EmbeddingKind,
    /// Expected vector dimensionality.
    pub embedding_dim: usize,
    /// Inputs longer than this are truncated before embedding.
    pub embedding_max_chars: usize,
    /// Concurrent embedding requests during ingestion.
    pub embedding_concurrency: usize,
}

impl StoreConfig {
    /// Defaults rooted at `storage_dir`.
    pub fn new_default(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            embedding_kind: EmbeddingKind::Hash,
            embedding_dim: 384,
            embedding_max_chars: 8000,
            embedding_concurrency: 4,
        }
    }

    /// Build from environment variables.
    ///
    /// - `STORAGE_DIR` (default: "storage")
    /// - `CHUNK_SIZE` (default: 1000, range 100..=2000)
    /// - `CHUNK_OVERLAP` (default: 200, range 0..=500)
    /// - `RAG_TOP_K` (default: 5, range 1..=20)
    /// - `MAX_UPLOAD_SIZE_MB` (default: 10)
    /// - `EMBEDDING_PROVIDER` (`hash` → Hash, anything else → Remote)
    /// - `EMBEDDING_DIM` (default: 384)
    /// - `EMBEDDING_MAX_CHARS` (default: 8000)
    /// - `EMBEDDING_CONCURRENCY` (default: 4)
    pub fn from_env() -> Result<Self, StoreError> {
        let d = Self::new_default(env_or("STORAGE_DIR", "storage"));
        let embedding_kind = match env_or("EMBEDDING_PROVIDER", "hash").trim().to_lowercase().as_str() {
            "hash" => EmbeddingKind::Hash,
            _ => EmbeddingKind::Remote,
        };

        let cfg = Self {
            chunk_size: read_env("CHUNK_SIZE")?.unwrap_or(d.chunk_size),
            chunk_overlap: read_env("CHUNK_OVERLAP")?.unwrap_or(d.chunk_overlap),
            top_k: read_env("RAG_TOP_K")?.unwrap_or(d.top_k),
            max_upload_bytes: read_env::<u64>("MAX_UPLOAD_SIZE_MB")?
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(d.max_upload_bytes),
            embedding_kind,
            embedding_dim: read_env("EMBEDDING_DIM")?.unwrap_or(d.embedding_dim),
            embedding_max_chars: read_env("EMBEDDING_MAX_CHARS")?.unwrap_or(d.embedding_max_chars),
            embedding_concurrency: read_env("EMBEDDING_CONCURRENCY")?
                .unwrap_or(d.embedding_concurrency),
            ..d
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !(100..=2000).contains(&self.chunk_size) {
            return Err(StoreError::Config("CHUNK_SIZE must be in 100..=2000".into()));
        }
        if self.chunk_overlap > 500 || self.chunk_overlap >= self.chunk_size {
            return Err(StoreError::Config(
                "CHUNK_OVERLAP must be <= 500 and smaller than CHUNK_SIZE".into(),
            ));
        }
        if !(1..=20).contains(&self.top_k) {
            return Err(StoreError::Config("RAG_TOP_K must be in 1..=20".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(StoreError::Config("MAX_UPLOAD_SIZE_MB must be > 0".into()));
        }
        if self.embedding_dim == 0 {
            return Err(StoreError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.embedding_max_chars == 0 || self.embedding_concurrency == 0 {
            return Err(StoreError::Config(
                "EMBEDDING_MAX_CHARS and EMBEDDING_CONCURRENCY must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.storage_dir.join("index")
    }

    /// Opaque index blob.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir().join("qa_agent.index")
    }

    /// Document/chunk catalog stored next to the blob.
    pub fn catalog_path(&self) -> PathBuf {
        self.index_dir().join("catalog.json")
    }

    /// Source copies of every ingested document (the rebuild source of truth).
    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_dir.join("uploads")
    }

    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.uploads_dir().join(Path::new(filename))
    }
}

fn env_or(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn read_env<T: FromStr>(key: &str) -> Result<Option<T>, StoreError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| StoreError::Config(format!("failed to parse env variable {key} = '{v}'"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_paths_are_fixed() {
        let cfg = StoreConfig::new_default("/tmp/qa");
        cfg.validate().unwrap();
        assert_eq!(cfg.index_path(), PathBuf::from("/tmp/qa/index/qa_agent.index"));
        assert_eq!(cfg.catalog_path(), PathBuf::from("/tmp/qa/index/catalog.json"));
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/tmp/qa/uploads"));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let mut cfg = StoreConfig::new_default("s");
        cfg.chunk_size = 200;
        cfg.chunk_overlap = 200;
        assert!(cfg.validate().is_err());
        cfg.chunk_overlap = 600;
        cfg.chunk_size = 1000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn top_k_range() {
        let mut cfg = StoreConfig::new_default("s");
        cfg.top_k = 0;
        assert!(cfg.validate().is_err());
        cfg.top_k = 21;
        assert!(cfg.validate().is_err());
    }
}
