//! Ingestion pipeline: bytes → text → chunks → vectors, then apply to the in-memory state.
//!
//! [`prepare`] does all the slow work (extraction, embedding) without touching shared state;
//! [`apply`] is the short critical section that swaps the document into index and catalog.

use std::path::Path;

use chrono::{DateTime, Utc};
use services::{hash::content_hash, uuid::document_id};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::chunker::ChunkerConfig;
use crate::config::StoreConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_batch;
use crate::errors::{Result, StoreError};
use crate::index::FlatIndex;
use crate::loader::{DocumentFormat, extract_text_async};
use crate::record::{Chunk, Document, IngestRejection, RebuildReport};

/// Index plus catalog, always mutated together.
#[derive(Clone, Debug)]
pub struct StoreState {
    pub index: FlatIndex,
    pub catalog: Catalog,
}

impl StoreState {
    pub fn empty(embedder: &str, dim: usize) -> Self {
        Self {
            index: FlatIndex::new(dim),
            catalog: Catalog::new(embedder, dim),
        }
    }
}

/// A fully processed document, ready to be applied.
#[derive(Debug)]
pub struct Prepared {
    pub document: Document,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
    pub warnings: Vec<String>,
}

/// Strips any directory part and rejects names that cannot be stored.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let base = Path::new(name.trim())
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." {
        return Err(StoreError::InvalidInput(format!("invalid filename '{name}'")));
    }
    Ok(base.to_string())
}

/// Validates, extracts, chunks and embeds one document.
///
/// # Errors
/// `FileTooLarge`, `UnsupportedFormat`, `Extraction`, `EmptyDocument` or an embedding failure.
pub async fn prepare(
    cfg: &StoreConfig,
    chunker: ChunkerConfig,
    provider: &dyn EmbeddingsProvider,
    filename: &str,
    bytes: Vec<u8>,
    uploaded_at: DateTime<Utc>,
) -> Result<Prepared> {
    let size = bytes.len() as u64;
    if size > cfg.max_upload_bytes {
        return Err(StoreError::FileTooLarge {
            size,
            limit: cfg.max_upload_bytes,
        });
    }
    let format = DocumentFormat::from_filename(filename)?;
    let hash = content_hash(&bytes);
    let doc_id = document_id(filename, &hash);

    let text = extract_text_async(filename.to_string(), format, bytes).await?;
    if text.trim().is_empty() {
        return Err(StoreError::EmptyDocument(filename.to_string()));
    }

    let chunks: Vec<Chunk> = chunker
        .chunks(&text)
        .map(|s| Chunk {
            id: Chunk::make_id(&doc_id, s.index),
            document_id: doc_id.clone(),
            index: s.index,
            text: s.text.to_string(),
            start: s.start,
            end: s.end,
        })
        .collect();
    debug!(filename, chunks = chunks.len(), "document chunked");

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let batch = embed_batch(
        &texts,
        provider,
        cfg.embedding_max_chars,
        cfg.embedding_concurrency,
    )
    .await?;

    let warnings = batch
        .truncated
        .iter()
        .map(|i| {
            format!(
                "chunk {i} exceeded {} characters and was truncated before embedding",
                cfg.embedding_max_chars
            )
        })
        .collect();

    Ok(Prepared {
        document: Document {
            id: doc_id,
            filename: filename.to_string(),
            format,
            uploaded_at,
            size_bytes: size,
            content_hash: hash,
            chunk_count: chunks.len(),
        },
        chunks,
        vectors: batch.vectors,
        warnings,
    })
}

/// Applies a prepared document. A previous document with the same filename is replaced
/// (last write wins); its id is returned.
pub fn apply(state: &mut StoreState, prepared: Prepared) -> Result<Option<String>> {
    let replaced = state
        .catalog
        .find_by_filename(&prepared.document.filename)
        .filter(|d| d.id != prepared.document.id)
        .map(|d| d.id.clone());

    if let Some(old) = &replaced {
        remove_document(state, old);
    }
    // Same id means same content: drop and re-insert so nothing is duplicated.
    remove_document(state, &prepared.document.id);

    for (chunk, vector) in prepared.chunks.iter().zip(&prepared.vectors) {
        state.index.insert(chunk.id.clone(), vector)?;
    }
    for chunk in prepared.chunks {
        state.catalog.chunks.insert(chunk.id.clone(), chunk);
    }
    state
        .catalog
        .documents
        .insert(prepared.document.id.clone(), prepared.document);
    Ok(replaced)
}

/// Removes a document's chunks from index and catalog. Returns the document if it existed.
pub fn remove_document(state: &mut StoreState, document_id: &str) -> Option<Document> {
    let prefix = format!("{document_id}:");
    let removed = state.index.remove_where(|id| id.starts_with(&prefix));
    let doc = state.catalog.remove_document(document_id);
    if doc.is_some() {
        debug!(document_id, vectors = removed, "document removed");
    }
    doc
}

/// Rebuilds state from every supported file in the uploads directory.
pub async fn rebuild_state(
    cfg: &StoreConfig,
    chunker: ChunkerConfig,
    provider: &dyn EmbeddingsProvider,
) -> Result<(StoreState, RebuildReport)> {
    let mut state = StoreState::empty(provider.name(), provider.dim());
    let mut report = RebuildReport::default();
    let dir = cfg.uploads_dir();

    if !dir.exists() {
        info!(dir = %dir.display(), "no uploads directory; starting with an empty index");
        return Ok((state, report));
    }

    let mut paths: Vec<_> = walkdir::WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    for path in paths {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if DocumentFormat::from_filename(&filename).is_err() {
            continue;
        }
        let uploaded_at = tokio::fs::metadata(&path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let outcome = match tokio::fs::read(&path).await {
            Ok(bytes) => prepare(cfg, chunker, provider, &filename, bytes, uploaded_at).await,
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(p) => {
                report.chunks += p.chunks.len();
                apply(&mut state, p)?;
                report.documents += 1;
            }
            Err(e) if e.is_embedding_failure() => return Err(e),
            Err(e) => {
                warn!(filename = %filename, error = %e, "skipping file during rebuild");
                report.failed.push(rejection(&filename, &e));
            }
        }
    }

    info!(
        documents = report.documents,
        chunks = report.chunks,
        failed = report.failed.len(),
        "index rebuilt from uploads"
    );
    Ok((state, report))
}

/// Stable code + message for a per-file failure.
pub fn rejection(filename: &str, err: &StoreError) -> IngestRejection {
    let code = match err {
        StoreError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
        StoreError::FileTooLarge { .. } => "FILE_TOO_LARGE",
        StoreError::Extraction { .. } | StoreError::EmptyDocument(_) | StoreError::InvalidInput(_) => {
            "VALIDATION_ERROR"
        }
        StoreError::Embedding(_) | StoreError::VectorSizeMismatch { .. } => "EMBEDDING_FAILURE",
        _ => "INTERNAL_ERROR",
    };
    IngestRejection {
        filename: filename.to_string(),
        code,
        reason: err.to_string(),
    }
}
