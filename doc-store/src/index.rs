//! Flat (exact) L2 vector index with a fixed dimension and a versioned bincode blob.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};

const BLOB_MAGIC: [u8; 4] = *b"QAIX";
const BLOB_VERSION: u32 = 1;

/// A query hit: chunk id and Euclidean distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub chunk_id: String,
    pub distance: f32,
}

/// Vectors stored contiguously; position `i` belongs to `ids[i]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct Blob {
    magic: [u8; 4],
    version: u32,
    index: FlatIndex,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.ids.iter().any(|id| id == chunk_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Inserts a vector. An existing id is overwritten in place (keeps its position).
    pub fn insert(&mut self, chunk_id: impl Into<String>, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(StoreError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let chunk_id = chunk_id.into();
        match self.ids.iter().position(|id| *id == chunk_id) {
            Some(pos) => {
                self.vectors[pos * self.dim..(pos + 1) * self.dim].copy_from_slice(vector);
            }
            None => {
                self.ids.push(chunk_id);
                self.vectors.extend_from_slice(vector);
            }
        }
        Ok(())
    }

    /// Up to `k` nearest neighbours, ascending by distance; ties keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.query_where(vector, k, |_| true)
    }

    /// Like [`FlatIndex::query`], restricted to ids accepted by `keep`.
    pub fn query_where<F>(&self, vector: &[f32], k: usize, keep: F) -> Result<Vec<Neighbor>>
    where
        F: Fn(&str) -> bool,
    {
        if vector.len() != self.dim {
            return Err(StoreError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .ids
            .iter()
            .enumerate()
            .filter(|(_, id)| keep(id))
            .map(|(i, _)| (i, l2(vector, self.row(i))))
            .collect();
        // Stable sort: equal distances stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| Neighbor {
                chunk_id: self.ids[i].clone(),
                distance,
            })
            .collect())
    }

    /// Restricts results to the given chunk ids.
    pub fn query_filtered(
        &self,
        vector: &[f32],
        k: usize,
        allowed: &HashSet<String>,
    ) -> Result<Vec<Neighbor>> {
        self.query_where(vector, k, |id| allowed.contains(id))
    }

    /// Removes every entry whose id matches; relative order of the rest is preserved.
    /// Returns the number of removed entries.
    pub fn remove_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.ids.len();
        let mut ids = Vec::with_capacity(before);
        let mut vectors = Vec::with_capacity(self.vectors.len());
        for (i, id) in self.ids.iter().enumerate() {
            if !pred(id) {
                ids.push(id.clone());
                vectors.extend_from_slice(self.row(i));
            }
        }
        self.ids = ids;
        self.vectors = vectors;
        before - self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.vectors.clear();
    }

    pub fn vector(&self, chunk_id: &str) -> Option<&[f32]> {
        self.ids
            .iter()
            .position(|id| id == chunk_id)
            .map(|i| self.row(i))
    }

    /// Serializes to the opaque on-disk blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let blob = Blob {
            magic: BLOB_MAGIC,
            version: BLOB_VERSION,
            index: self.clone(),
        };
        bincode::serialize(&blob).map_err(|e| StoreError::IndexUnavailable(format!("encode: {e}")))
    }

    /// Parses and validates a blob produced by [`FlatIndex::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let blob: Blob = bincode::deserialize(bytes)
            .map_err(|e| StoreError::IndexUnavailable(format!("corrupt index blob: {e}")))?;
        if blob.magic != BLOB_MAGIC || blob.version != BLOB_VERSION {
            return Err(StoreError::IndexUnavailable(format!(
                "unexpected index blob header (version {})",
                blob.version
            )));
        }
        let idx = blob.index;
        if idx.dim == 0 || idx.vectors.len() != idx.ids.len() * idx.dim {
            return Err(StoreError::IndexUnavailable(
                "index blob is internally inconsistent".into(),
            ));
        }
        Ok(idx)
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dim..(i + 1) * self.dim]
    }
}

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// User-facing similarity for a distance.
pub fn score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx() -> FlatIndex {
        let mut i = FlatIndex::new(2);
        i.insert("a", &[0.0, 0.0]).unwrap();
        i.insert("b", &[3.0, 4.0]).unwrap();
        i.insert("c", &[1.0, 0.0]).unwrap();
        i.insert("d", &[0.0, 1.0]).unwrap();
        i
    }

    #[test]
    fn results_ascend_with_ties_in_insertion_order() {
        let hits = idx().query(&[0.0, 0.0], 10).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d", "b"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(hits[3].distance, 5.0);
    }

    #[test]
    fn never_more_than_k() {
        let i = idx();
        assert_eq!(i.query(&[0.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(i.query(&[0.0, 0.0], 0).unwrap().len(), 0);
        assert!(FlatIndex::new(2).query(&[1.0, 1.0], 3).unwrap().is_empty());
    }

    #[test]
    fn dimension_is_enforced() {
        let mut i = FlatIndex::new(3);
        assert!(matches!(
            i.insert("x", &[1.0]),
            Err(StoreError::VectorSizeMismatch { got: 1, want: 3 })
        ));
        assert!(i.query(&[1.0, 2.0], 1).is_err());
    }

    #[test]
    fn reinsert_overwrites_without_duplicates() {
        let mut i = idx();
        i.insert("b", &[0.5, 0.0]).unwrap();
        assert_eq!(i.len(), 4);
        assert_eq!(i.vector("b"), Some(&[0.5, 0.0][..]));
    }

    #[test]
    fn remove_keeps_relative_order() {
        let mut i = idx();
        assert_eq!(i.remove_where(|id| id == "a" || id == "c"), 2);
        assert_eq!(i.ids().collect::<Vec<_>>(), vec!["b", "d"]);
        assert_eq!(i.vector("d"), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn filtered_query() {
        let allowed: HashSet<String> = ["b".to_string(), "d".to_string()].into();
        let hits = idx().query_filtered(&[0.0, 0.0], 5, &allowed).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b"]);
    }

    #[test]
    fn blob_roundtrip_and_corruption() {
        let i = idx();
        let bytes = i.to_bytes().unwrap();
        let back = FlatIndex::from_bytes(&bytes).unwrap();
        assert_eq!(back.ids().collect::<Vec<_>>(), i.ids().collect::<Vec<_>>());
        assert!(matches!(
            FlatIndex::from_bytes(&bytes[..bytes.len() / 2]),
            Err(StoreError::IndexUnavailable(_))
        ));
        assert!(FlatIndex::from_bytes(b"garbage").is_err());
    }

    #[test]
    fn score_is_monotonic() {
        assert_eq!(score(0.0), 1.0);
        assert!(score(1.0) > score(2.0));
    }
}
