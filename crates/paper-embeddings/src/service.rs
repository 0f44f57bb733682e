//! Embedding and rerank service traits.

use async_trait::async_trait;

use crate::error::{EmbeddingError, RerankError};
use crate::model::Embedding;

/// Text embedding service.
///
/// Implementations must be deterministic for a given model version and
/// thread-safe. A failure must surface as an error, never as a substitute
/// vector: ranking correctness depends on real embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed a batch of texts, preserving order.
    ///
    /// The default implementation embeds one at a time; services with a
    /// batch endpoint should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Cross-encoder relevance service.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each passage's relevance to the query, in input order,
    /// normalized to [0, 1].
    async fn score_batch(&self, query: &str, passages: &[String])
        -> Result<Vec<f32>, RerankError>;
}
