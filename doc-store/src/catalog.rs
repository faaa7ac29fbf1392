//! Document and chunk metadata persisted next to the index blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{Chunk, Document};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Embedder that produced the stored vectors.
    #[serde(default)]
    pub embedder: String,
    pub dimension: usize,
    pub documents: BTreeMap<String, Document>,
    pub chunks: BTreeMap<String, Chunk>,
}

impl Catalog {
    pub fn new(embedder: impl Into<String>, dimension: usize) -> Self {
        Self {
            embedder: embedder.into(),
            dimension,
            ..Default::default()
        }
    }

    pub fn find_by_filename(&self, filename: &str) -> Option<&Document> {
        self.documents.values().find(|d| d.filename == filename)
    }

    /// Chunks of one document in sequence order.
    pub fn chunks_of<'a>(&'a self, document_id: &'a str) -> impl Iterator<Item = &'a Chunk> + 'a {
        // Chunk ids are "{doc}:{index:05}", so BTreeMap order is sequence order.
        self.chunks.values().filter(move |c| c.document_id == document_id)
    }

    /// Removes a document with its chunks, returning the removed document.
    pub fn remove_document(&mut self, document_id: &str) -> Option<Document> {
        let doc = self.documents.remove(document_id)?;
        self.chunks.retain(|_, c| c.document_id != document_id);
        Some(doc)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.chunks.clear();
    }
}
