//! Retrieval error types.

use thiserror::Error;

/// Errors that can occur while building or querying a retriever.
///
/// Service failures are surfaced, never papered over with substitute
/// vectors or scores. Frontier exhaustion and unknown node ids are *not*
/// errors; they shorten or skip results instead.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Embedding service failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] paper_embeddings::EmbeddingError),

    /// Cross-encoder service failure.
    #[error("rerank error: {0}")]
    Rerank(#[from] paper_embeddings::RerankError),

    /// Vector index rejected an insert while building.
    #[error("index error: {0}")]
    Index(#[from] paper_vector::IndexError),
}
