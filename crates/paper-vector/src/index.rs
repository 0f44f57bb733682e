//! Vector index trait and types.

use std::collections::HashSet;

use paper_embeddings::Embedding;

use crate::error::IndexError;

/// One entry to insert: an id, its embedding, and the document text that
/// was embedded.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub embedding: Embedding,
    pub document: String,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>, embedding: Embedding, document: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            document: document.into(),
        }
    }
}

/// One ranked query result.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    pub document: String,
    /// Cosine similarity in [-1, 1], higher is more similar.
    pub score: f32,
}

/// A vector index keyed by string ids.
///
/// Implementations must be safe for concurrent queries (`&self`); building
/// happens before querying.
pub trait VectorIndex: Send + Sync {
    /// Embedding dimension, or `None` while the index is empty.
    fn dimension(&self) -> Option<usize>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a batch of entries. All vectors must share the index
    /// dimension and ids must be unique.
    fn add_batch(&mut self, entries: Vec<IndexEntry>) -> Result<(), IndexError>;

    /// Return the `k` nearest entries to `query` by cosine similarity,
    /// best first. With `restrict` set, only ids in the given set are
    /// considered — ids outside it are never returned, and ids in the set
    /// but absent from the index are silently ignored.
    fn query(
        &self,
        query: &Embedding,
        k: usize,
        restrict: Option<&HashSet<String>>,
    ) -> Vec<IndexMatch>;
}
