//! Document store for retrieval-augmented generation.
//!
//! This crate provides a clean API to:
//! - Ingest documentation (text, markdown, JSON, PDF, HTML, DOCX) into chunked, embedded records
//! - Retrieve the top‑K chunks for a textual query from a flat L2 index
//! - Persist index + catalog to disk and rebuild them from the stored uploads
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.
//! [`DocStore`] is the single entry point for application code.

mod catalog;
mod chunker;
mod config;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod ingest;
mod loader;
mod persist;
mod record;
mod retrieve;

pub use chunker::{ChunkSpan, Chunker, ChunkerConfig, reconstruct};
pub use config::{EmbeddingKind, StoreConfig};
pub use embed::{EmbeddingsProvider, HashEmbedder, LlmEmbedder};
pub use embed_pool::{EmbeddedBatch, embed_batch};
pub use errors::{Result, StoreError};
pub use index::{FlatIndex, Neighbor};
pub use loader::{DocumentFormat, extract_text};
pub use record::{
    Chunk, DirectoryReport, Document, IngestRejection, IngestReport, RebuildReport,
    RetrievedChunk, StoreStats,
};

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::LlmClient;
use chrono::Utc;
use services::hash::content_hash;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use ingest::StoreState;

/// Minimum length of raw text accepted by [`DocStore::ingest_text`].
pub const MIN_TEXT_CHARS: usize = 10;

/// Builds the embedder selected by `cfg.embedding_kind`.
///
/// # Errors
/// `StoreError::Config` when remote embeddings are requested but `llm` has no embedding profile.
pub fn provider_for(cfg: &StoreConfig, llm: &Arc<LlmClient>) -> Result<Arc<dyn EmbeddingsProvider>> {
    Ok(match cfg.embedding_kind {
        EmbeddingKind::Hash => Arc::new(HashEmbedder::new(cfg.embedding_dim)),
        EmbeddingKind::Remote => Arc::new(LlmEmbedder::new(Arc::clone(llm), cfg.embedding_dim)?),
    })
}

/// High-level facade over loader, chunker, embedder, index and persistence.
///
/// Reads share a `RwLock`; writes (ingest, delete, clear, rebuild) are serialized by a
/// separate mutex so embedding never blocks readers.
pub struct DocStore {
    cfg: StoreConfig,
    chunker: ChunkerConfig,
    provider: Arc<dyn EmbeddingsProvider>,
    state: RwLock<StoreState>,
    write_lock: Mutex<()>,
}

impl DocStore {
    /// Opens the store: loads the persisted index, or rebuilds it from uploads when it is
    /// missing, corrupt or was produced by a different embedder.
    ///
    /// # Errors
    /// Invalid configuration, I/O failures, or embedding failures during a rebuild.
    pub async fn open(cfg: StoreConfig, provider: Arc<dyn EmbeddingsProvider>) -> Result<Self> {
        cfg.validate()?;
        let chunker = cfg.chunker();
        chunker.validate()?;
        if provider.dim() != cfg.embedding_dim {
            return Err(StoreError::Config(format!(
                "embedder '{}' produces {} dimensions, EMBEDDING_DIM is {}",
                provider.name(),
                provider.dim(),
                cfg.embedding_dim
            )));
        }
        tokio::fs::create_dir_all(cfg.uploads_dir()).await?;
        tokio::fs::create_dir_all(cfg.index_dir()).await?;

        let loaded = match persist::load(&cfg, provider.dim()).await {
            Ok((_, catalog)) if catalog.embedder != provider.name() => Err(StoreError::IndexUnavailable(
                format!("index was built by '{}'", catalog.embedder),
            )),
            other => other,
        };

        let state = match loaded {
            Ok((index, catalog)) => StoreState { index, catalog },
            Err(StoreError::IndexUnavailable(reason)) => {
                warn!(%reason, "persisted index unavailable; rebuilding from uploads");
                let (state, report) = ingest::rebuild_state(&cfg, chunker, provider.as_ref()).await?;
                persist::save(&cfg, &state.index, &state.catalog).await?;
                info!(documents = report.documents, chunks = report.chunks, "index recovered");
                state
            }
            Err(e) => return Err(e),
        };

        info!(
            storage = %cfg.storage_dir.display(),
            embedder = provider.name(),
            documents = state.catalog.documents.len(),
            vectors = state.index.len(),
            "document store ready"
        );
        Ok(Self {
            cfg,
            chunker,
            provider,
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
        })
    }

    /// Ingests one uploaded file.
    ///
    /// Identical content under the same name is a no-op (`unchanged = true`); new content
    /// under an existing name replaces the previous document.
    ///
    /// # Errors
    /// `UnsupportedFormat`, `FileTooLarge`, `Extraction`, `EmptyDocument`, embedding failures, I/O.
    #[instrument(skip_all, fields(filename = %filename, size = bytes.len()))]
    pub async fn ingest_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<IngestReport> {
        let filename = ingest::sanitize_filename(filename)?;
        let _guard = self.write_lock.lock().await;

        let doc_id = services::uuid::document_id(&filename, &content_hash(&bytes));
        if let Some(doc) = self.state.read().await.catalog.documents.get(&doc_id) {
            debug!(document_id = %doc_id, "identical content already indexed");
            return Ok(IngestReport {
                document: doc.clone(),
                replaced: None,
                unchanged: true,
                warnings: Vec::new(),
            });
        }

        let upload_path = self.cfg.upload_path(&filename);
        let prepared = ingest::prepare(
            &self.cfg,
            self.chunker,
            self.provider.as_ref(),
            &filename,
            bytes.clone(),
            Utc::now(),
        )
        .await?;
        tokio::fs::write(&upload_path, &bytes).await?;

        let document = prepared.document.clone();
        let warnings = prepared.warnings.clone();
        let replaced = {
            let mut state = self.state.write().await;
            ingest::apply(&mut state, prepared)?
        };
        self.save().await?;

        info!(
            document_id = %document.id,
            chunks = document.chunk_count,
            replaced = replaced.is_some(),
            "document ingested"
        );
        Ok(IngestReport {
            document,
            replaced,
            unchanged: false,
            warnings,
        })
    }

    /// Ingests raw text (at least [`MIN_TEXT_CHARS`] non-blank characters).
    ///
    /// Without a `source_name` the document is named `text-<hash8>.txt`; a name without a
    /// supported extension gets `.txt` appended.
    pub async fn ingest_text(&self, text: &str, source_name: Option<&str>) -> Result<IngestReport> {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Err(StoreError::InvalidInput(format!(
                "text must contain at least {MIN_TEXT_CHARS} characters"
            )));
        }
        let name = match source_name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(n) if DocumentFormat::from_filename(n).is_ok() => n.to_string(),
            Some(n) => format!("{n}.txt"),
            None => format!("text-{}.txt", &content_hash(text.as_bytes())[..8]),
        };
        self.ingest_bytes(&name, text.as_bytes().to_vec()).await
    }

    /// Ingests every supported file under `dir` (one level unless `recursive`).
    ///
    /// Per-file failures are collected into the report instead of aborting the batch.
    ///
    /// # Errors
    /// `NotFound` if `dir` is not a directory.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display(), recursive = recursive))]
    pub async fn ingest_directory(&self, dir: impl AsRef<Path>, recursive: bool) -> Result<DirectoryReport> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(StoreError::NotFound(format!("directory {}", dir.display())));
        }

        let mut walker = walkdir::WalkDir::new(dir).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }
        let files: Vec<_> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        let mut report = DirectoryReport::default();
        for path in files {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if DocumentFormat::from_filename(&name).is_err() {
                report.skipped += 1;
                continue;
            }
            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) => self.ingest_bytes(&name, bytes).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Ok(r) => report.ingested.push(r),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "file rejected");
                    report.rejected.push(ingest::rejection(&name, &e));
                }
            }
        }

        info!(
            ingested = report.ingested.len(),
            rejected = report.rejected.len(),
            skipped = report.skipped,
            "directory ingestion finished"
        );
        Ok(report)
    }

    /// Deletes a document, its chunks, vectors and stored upload.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn delete_document(&self, document_id: &str) -> Result<Document> {
        let _guard = self.write_lock.lock().await;
        let doc = {
            let mut state = self.state.write().await;
            ingest::remove_document(&mut state, document_id)
        }
        .ok_or_else(|| StoreError::NotFound(format!("document {document_id}")))?;

        match tokio::fs::remove_file(self.cfg.upload_path(&doc.filename)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.save().await?;
        info!(document_id, filename = %doc.filename, "document deleted");
        Ok(doc)
    }

    /// Removes every document and stored upload. Returns the number of removed documents.
    pub async fn clear(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let removed = {
            let mut state = self.state.write().await;
            let n = state.catalog.documents.len();
            state.index.clear();
            state.catalog.clear();
            n
        };

        let uploads = self.cfg.uploads_dir();
        if uploads.exists() {
            tokio::fs::remove_dir_all(&uploads).await?;
        }
        tokio::fs::create_dir_all(&uploads).await?;
        self.save().await?;
        warn!(documents = removed, "document store cleared");
        Ok(removed)
    }

    /// Rebuilds index and catalog from the uploads directory (recovery path).
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let _guard = self.write_lock.lock().await;
        let (fresh, report) =
            ingest::rebuild_state(&self.cfg, self.chunker, self.provider.as_ref()).await?;
        *self.state.write().await = fresh;
        self.save().await?;
        Ok(report)
    }

    /// Top-`k` chunks for `query` in rank order (`k` defaults to `RAG_TOP_K`).
    ///
    /// An empty index yields an empty list without calling the embedder.
    ///
    /// # Errors
    /// `InvalidInput` for a blank query or `k` outside 1..=20; embedding failures.
    #[instrument(skip_all, fields(k = ?k, scoped = scope.is_some()))]
    pub async fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
        scope: Option<&[String]>,
    ) -> Result<Vec<RetrievedChunk>> {
        let k = k.unwrap_or(self.cfg.top_k);
        if !(1..=20).contains(&k) {
            return Err(StoreError::InvalidInput("top_k must be in 1..=20".into()));
        }
        if query.trim().is_empty() {
            return Err(StoreError::InvalidInput("query must not be empty".into()));
        }
        if self.state.read().await.index.is_empty() {
            debug!("index is empty; no context available");
            return Ok(Vec::new());
        }

        let qv = embed_pool::embed_one(query, self.provider.as_ref(), self.cfg.embedding_max_chars).await?;
        let state = self.state.read().await;
        retrieve::search_state(&state, &qv, k, scope)
    }

    /// All documents, oldest first.
    pub async fn documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.state.read().await.catalog.documents.values().cloned().collect();
        docs.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then_with(|| a.filename.cmp(&b.filename)));
        docs
    }

    pub async fn document(&self, document_id: &str) -> Option<Document> {
        self.state.read().await.catalog.documents.get(document_id).cloned()
    }

    /// Chunks of one document in sequence order.
    pub async fn chunks_of(&self, document_id: &str) -> Vec<Chunk> {
        self.state.read().await.catalog.chunks_of(document_id).cloned().collect()
    }

    /// True once at least one document is indexed.
    pub async fn is_ingested(&self) -> bool {
        !self.state.read().await.index.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            documents: state.catalog.documents.len(),
            chunks: state.catalog.chunks.len(),
            vectors: state.index.len(),
            dimension: state.index.dim(),
            chunk_size: self.chunker.size,
            chunk_overlap: self.chunker.overlap,
            embedder: self.provider.name().to_string(),
        }
    }

    /// Persists index blob and catalog.
    pub async fn save(&self) -> Result<()> {
        let state = self.state.read().await;
        persist::save(&self.cfg, &state.index, &state.catalog).await
    }

    pub fn embedder_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }
}
