//! Remote embedding provider backed by the shared [`LlmClient`] embedding profile.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmClient;
use tracing::trace;

use super::{EmbeddingsProvider, l2_normalize};
use crate::errors::StoreError;

/// Delegates to Ollama `/api/embeddings` or OpenAI-compatible `/v1/embeddings`.
#[derive(Clone, Debug)]
pub struct LlmEmbedder {
    client: Arc<LlmClient>,
    dim: usize,
    name: String,
}

impl LlmEmbedder {
    /// # Errors
    /// [`StoreError::Config`] when the client has no embedding profile.
    pub fn new(client: Arc<LlmClient>, dim: usize) -> Result<Self, StoreError> {
        let (_, embedding) = client.profiles();
        let Some(profile) = embedding else {
            return Err(StoreError::Config(
                "remote embeddings requested but no embedding profile is configured".into(),
            ));
        };
        let name = format!("{:?}:{}", profile.provider, profile.model).to_lowercase();
        Ok(Self { client, dim, name })
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let mut v = self.client.embed(text).await?;
            if v.len() != self.dim {
                return Err(StoreError::VectorSizeMismatch {
                    got: v.len(),
                    want: self.dim,
                });
            }
            l2_normalize(&mut v);
            trace!(dim = v.len(), "remote embedding received");
            Ok(v)
        })
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        &self.name
    }
}
