//! Core data models used by the library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::loader::DocumentFormat;

/// An uploaded document. Created on ingestion and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Deterministic id derived from filename and content hash.
    pub id: String,
    pub filename: String,
    pub format: DocumentFormat,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// blake3 hex of the raw bytes.
    pub content_hash: String,
    pub chunk_count: usize,
}

/// A contiguous segment of a document's extracted text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `"{document_id}:{index:05}"`
    pub id: String,
    pub document_id: String,
    pub index: usize,
    pub text: String,
    /// Character offsets into the extracted text, `end` exclusive.
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn make_id(document_id: &str, index: usize) -> String {
        format!("{document_id}:{index:05}")
    }
}

/// A single retrieval hit.
#[derive(Clone, Debug, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Filename of the owning document.
    pub source: String,
    /// Euclidean distance to the query vector.
    pub distance: f32,
    /// `1 / (1 + distance)`, higher is better.
    pub score: f32,
}

/// Outcome of ingesting one document.
#[derive(Clone, Debug, Serialize)]
pub struct IngestReport {
    pub document: Document,
    /// Id of a previous version with the same filename that was replaced.
    pub replaced: Option<String>,
    /// True when identical content was already indexed and nothing changed.
    pub unchanged: bool,
    /// Non-fatal notes (e.g. truncated chunks).
    pub warnings: Vec<String>,
}

/// Per-file rejection produced by batch ingestion.
#[derive(Clone, Debug, Serialize)]
pub struct IngestRejection {
    pub filename: String,
    pub code: &'static str,
    pub reason: String,
}

impl IngestRejection {
    /// Stable code and message for a failed file.
    pub fn from_error(filename: &str, err: &crate::StoreError) -> Self {
        crate::ingest::rejection(filename, err)
    }
}

/// Result of `DocStore::ingest_directory`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DirectoryReport {
    pub ingested: Vec<IngestReport>,
    pub rejected: Vec<IngestRejection>,
    /// Files skipped because of an unsupported extension.
    pub skipped: usize,
}

/// Result of `DocStore::rebuild`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RebuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub failed: Vec<IngestRejection>,
}

/// Store counters.
#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    pub chunks: usize,
    pub vectors: usize,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedder: String,
}
