//! Embedding and rerank service error types.

use thiserror::Error;

/// Errors that can occur while embedding text.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP transport or server-side failure.
    #[error("embedding service error: {0}")]
    Service(String),

    /// The service rejected the request for rate limiting.
    #[error("embedding service rate limit exceeded")]
    RateLimited,

    /// The response body could not be interpreted.
    #[error("failed to parse embedding response: {0}")]
    Parse(String),

    /// Client misconfiguration.
    #[error("embedder configuration error: {0}")]
    Config(String),

    /// The service returned the wrong number of vectors for a batch.
    #[error("embedding batch mismatch: sent {sent} texts, received {received} vectors")]
    BatchMismatch { sent: usize, received: usize },
}

/// Errors that can occur while reranking passages.
#[derive(Debug, Error)]
pub enum RerankError {
    /// HTTP transport or server-side failure.
    #[error("rerank service error: {0}")]
    Service(String),

    /// The service rejected the request for rate limiting.
    #[error("rerank service rate limit exceeded")]
    RateLimited,

    /// The response body could not be interpreted.
    #[error("failed to parse rerank response: {0}")]
    Parse(String),

    /// Client misconfiguration.
    #[error("reranker configuration error: {0}")]
    Config(String),

    /// The service returned scores for the wrong passages.
    #[error("rerank batch mismatch: sent {sent} passages, received {received} scores")]
    BatchMismatch { sent: usize, received: usize },
}
