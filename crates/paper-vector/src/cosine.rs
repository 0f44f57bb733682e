//! Exact in-memory cosine index.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use paper_embeddings::Embedding;

use crate::error::IndexError;
use crate::index::{IndexEntry, IndexMatch, VectorIndex};

/// Brute-force cosine similarity index over parallel columns.
///
/// Lives exactly as long as its owner; nothing is persisted.
#[derive(Default)]
pub struct CosineIndex {
    ids: Vec<String>,
    embeddings: Vec<Embedding>,
    documents: Vec<String>,
    slots: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl CosineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored document by id.
    pub fn document(&self, id: &str) -> Option<&str> {
        self.slots.get(id).map(|&slot| self.documents[slot].as_str())
    }
}

impl VectorIndex for CosineIndex {
    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn add_batch(&mut self, entries: Vec<IndexEntry>) -> Result<(), IndexError> {
        for entry in entries {
            let dim = entry.embedding.dimension();
            match self.dimension {
                None => self.dimension = Some(dim),
                Some(expected) if expected != dim => {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: dim,
                    });
                }
                Some(_) => {}
            }
            if self.slots.contains_key(&entry.id) {
                return Err(IndexError::DuplicateId(entry.id));
            }
            self.slots.insert(entry.id.clone(), self.ids.len());
            self.ids.push(entry.id);
            self.embeddings.push(entry.embedding);
            self.documents.push(entry.document);
        }
        debug!(vectors = self.ids.len(), "index updated");
        Ok(())
    }

    fn query(
        &self,
        query: &Embedding,
        k: usize,
        restrict: Option<&HashSet<String>>,
    ) -> Vec<IndexMatch> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = match restrict {
            // Iterate the smaller side: a frontier is usually far smaller
            // than the index.
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.slots.get(id))
                .map(|&slot| (slot, query.cosine_similarity(&self.embeddings[slot])))
                .collect(),
            None => self
                .embeddings
                .iter()
                .enumerate()
                .map(|(slot, emb)| (slot, query.cosine_similarity(emb)))
                .collect(),
        };
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(slot, score)| IndexMatch {
                id: self.ids[slot].clone(),
                document: self.documents[slot].clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, values: Vec<f32>) -> IndexEntry {
        IndexEntry::new(id, Embedding::new(values), format!("doc for {}", id))
    }

    fn build() -> CosineIndex {
        let mut index = CosineIndex::new();
        index
            .add_batch(vec![
                entry("a", vec![1.0, 0.0, 0.0]),
                entry("b", vec![0.0, 1.0, 0.0]),
                entry("c", vec![0.7, 0.7, 0.0]),
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_len_and_dimension() {
        let index = build();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), Some(3));
        assert!(!index.is_empty());
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = build();
        let hits = index.query(&Embedding::new(vec![1.0, 0.1, 0.0]), 3, None);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_query_truncates_to_k() {
        let index = build();
        let hits = index.query(&Embedding::new(vec![1.0, 0.0, 0.0]), 2, None);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_restricted_query_never_leaves_filter() {
        let index = build();
        let restrict: HashSet<String> = ["b".to_string(), "c".to_string()].into();
        let hits = index.query(&Embedding::new(vec![1.0, 0.0, 0.0]), 3, Some(&restrict));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| restrict.contains(&h.id)));
        // "c" has the x component, so it outranks "b" inside the filter.
        assert_eq!(hits[0].id, "c");
    }

    #[test]
    fn test_restricted_query_ignores_unknown_ids() {
        let index = build();
        let restrict: HashSet<String> = ["b".to_string(), "ghost".to_string()].into();
        let hits = index.query(&Embedding::new(vec![0.0, 1.0, 0.0]), 5, Some(&restrict));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut index = build();
        let result = index.add_batch(vec![entry("a", vec![0.0, 0.0, 1.0])]);
        assert!(matches!(result, Err(IndexError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = build();
        let result = index.add_batch(vec![entry("d", vec![1.0, 0.0])]);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_document_lookup() {
        let index = build();
        assert_eq!(index.document("b"), Some("doc for b"));
        assert!(index.document("ghost").is_none());
    }

    #[test]
    fn test_zero_k_returns_nothing() {
        let index = build();
        assert!(index.query(&Embedding::new(vec![1.0, 0.0, 0.0]), 0, None).is_empty());
    }
}
