//! Batch embedding with bounded concurrency, order preservation and truncation.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::{embed::EmbeddingsProvider, errors::StoreError};

/// Vectors in input order, plus the indices of inputs that had to be truncated.
#[derive(Debug, Default)]
pub struct EmbeddedBatch {
    pub vectors: Vec<Vec<f32>>,
    pub truncated: Vec<usize>,
}

/// Embeds `texts` in order.
///
/// # Arguments
/// - `provider`: embedding backend.
/// - `max_chars`: inputs longer than this are cut to `max_chars` characters (not rejected).
/// - `concurrency`: maximum number of in-flight embedding calls.
///
/// # Errors
/// Returns [`StoreError::VectorSizeMismatch`] if a vector does not match `provider.dim()`,
/// or the provider's error.
pub async fn embed_batch<S: AsRef<str>>(
    texts: &[S],
    provider: &dyn EmbeddingsProvider,
    max_chars: usize,
    concurrency: usize,
) -> Result<EmbeddedBatch, StoreError> {
    info!(
        total = texts.len(),
        concurrency,
        embedder = provider.name(),
        "embedding batch"
    );
    if texts.is_empty() {
        debug!("nothing to embed");
        return Ok(EmbeddedBatch::default());
    }

    let mut truncated = Vec::new();
    let inputs: Vec<String> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let (s, cut) = truncate_chars(t.as_ref(), max_chars);
            if cut {
                warn!(index = i, max_chars, "embedding input truncated");
                truncated.push(i);
            }
            s.to_owned()
        })
        .collect();

    let want = provider.dim();
    let vectors: Vec<Vec<f32>> = stream::iter(inputs)
        .map(|text| async move {
            let v = provider.embed(&text).await?;
            if v.len() != want {
                return Err(StoreError::VectorSizeMismatch { got: v.len(), want });
            }
            Ok(v)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    debug!(vectors = vectors.len(), truncated = truncated.len(), "batch embedded");
    Ok(EmbeddedBatch { vectors, truncated })
}

/// Embeds a single query string, truncating like [`embed_batch`].
pub async fn embed_one(
    text: &str,
    provider: &dyn EmbeddingsProvider,
    max_chars: usize,
) -> Result<Vec<f32>, StoreError> {
    let (s, cut) = truncate_chars(text, max_chars);
    if cut {
        warn!(max_chars, "query truncated before embedding");
    }
    let v = provider.embed(s).await?;
    if v.len() != provider.dim() {
        return Err(StoreError::VectorSizeMismatch {
            got: v.len(),
            want: provider.dim(),
        });
    }
    Ok(v)
}

fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => (&s[..i], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;
    use std::{future::Future, pin::Pin};

    struct LenEmbedder;

    impl EmbeddingsProvider for LenEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
            Box::pin(async move { Ok(vec![text.chars().count() as f32, 0.0]) })
        }
        fn dim(&self) -> usize {
            2
        }
        fn name(&self) -> &str {
            "len"
        }
    }

    struct WrongDim;

    impl EmbeddingsProvider for WrongDim {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
            Box::pin(async { Ok(vec![1.0]) })
        }
        fn dim(&self) -> usize {
            3
        }
        fn name(&self) -> &str {
            "wrong"
        }
    }

    #[tokio::test]
    async fn preserves_order_and_reports_truncation() {
        let texts = ["a", "bbbbbbbbbb", "ccc"];
        let out = embed_batch(&texts, &LenEmbedder, 5, 3).await.unwrap();
        let lens: Vec<f32> = out.vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 5.0, 3.0]);
        assert_eq!(out.truncated, vec![1]);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let err = embed_batch(&["x"], &WrongDim, 100, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::VectorSizeMismatch { got: 1, want: 3 }));
    }

    #[tokio::test]
    async fn same_input_same_vectors() {
        let e = HashEmbedder::new(32);
        let a = embed_batch(&["login form", "logout"], &e, 100, 2).await.unwrap();
        let b = embed_batch(&["login form", "logout"], &e, 100, 2).await.unwrap();
        assert_eq!(a.vectors, b.vectors);
    }
}
