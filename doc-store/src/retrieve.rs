//! Retrieval over a state snapshot: nearest chunks for a ready query vector.

use std::collections::HashSet;

use tracing::trace;

use crate::errors::Result;
use crate::index::score;
use crate::ingest::StoreState;
use crate::record::RetrievedChunk;

/// Top-`k` chunks for `query_vector`, optionally restricted to `scope` document ids.
///
/// Hits whose chunk is missing from the catalog are skipped.
pub fn search_state(
    state: &StoreState,
    query_vector: &[f32],
    k: usize,
    scope: Option<&[String]>,
) -> Result<Vec<RetrievedChunk>> {
    let neighbors = match scope {
        Some(doc_ids) if !doc_ids.is_empty() => {
            let docs: HashSet<&str> = doc_ids.iter().map(String::as_str).collect();
            let allowed: HashSet<String> = state
                .catalog
                .chunks
                .values()
                .filter(|c| docs.contains(c.document_id.as_str()))
                .map(|c| c.id.clone())
                .collect();
            state.index.query_filtered(query_vector, k, &allowed)?
        }
        _ => state.index.query(query_vector, k)?,
    };

    let hits: Vec<RetrievedChunk> = neighbors
        .into_iter()
        .filter_map(|n| {
            let chunk = state.catalog.chunks.get(&n.chunk_id)?;
            let source = state
                .catalog
                .documents
                .get(&chunk.document_id)
                .map(|d| d.filename.clone())
                .unwrap_or_default();
            Some(RetrievedChunk {
                chunk: chunk.clone(),
                source,
                distance: n.distance,
                score: score(n.distance),
            })
        })
        .collect();

    trace!(k, hits = hits.len(), scoped = scope.is_some(), "search completed");
    Ok(hits)
}
