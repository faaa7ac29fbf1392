//! Embedding providers.

use std::{future::Future, pin::Pin};

use crate::errors::StoreError;

pub mod hash;
pub mod llm;

pub use hash::HashEmbedder;
pub use llm::LlmEmbedder;

/// Provider interface for embedding generation.
///
/// Async because remote providers (Ollama, OpenAI-compatible) perform HTTP requests.
/// Implementations must return vectors of exactly [`EmbeddingsProvider::dim`] elements.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>>;

    /// Fixed output dimensionality.
    fn dim(&self) -> usize;

    /// Short name used in logs and stats.
    fn name(&self) -> &str;
}

/// Scales `v` to unit length in place (zero vectors stay zero).
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for x in v.iter_mut() {
            *x *= inv;
        }
    }
}
