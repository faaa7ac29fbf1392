//! Deterministic offline embedder based on feature hashing.
//!
//! Lower-cased alphanumeric tokens and adjacent token pairs are hashed with blake3
//! into `dim` signed buckets; the result is L2-normalized. Texts sharing vocabulary
//! land close together, which is all retrieval over documentation needs without a model.

use std::{future::Future, pin::Pin};

use services::hash::hash64;

use super::{EmbeddingsProvider, l2_normalize};
use crate::errors::StoreError;

#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Synchronous embedding used by the async trait impl.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        for t in &tokens {
            self.add_feature(&mut v, t.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let key = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut v, key.as_bytes(), 0.5);
        }

        l2_normalize(&mut v);
        v
    }

    fn add_feature(&self, v: &mut [f32], key: &[u8], weight: f32) {
        let h = hash64(key);
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign * weight;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingsProvider for HashEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.embed_sync(text)) })
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
    }

    #[test]
    fn deterministic_and_normalized() {
        let e = HashEmbedder::new(64);
        let a = e.embed_sync("Reset the password");
        let b = e.embed_sync("reset THE password!");
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_vocabulary_is_closer() {
        let e = HashEmbedder::default();
        let q = e.embed_sync("apply discount coupon at checkout");
        let near = e.embed_sync("Users can apply a discount coupon during checkout.");
        let far = e.embed_sync("The profile page shows avatar and biography fields.");
        assert!(dist(&q, &near) < dist(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashEmbedder::new(8);
        assert!(e.embed_sync("  ...  ").iter().all(|x| *x == 0.0));
    }
}
