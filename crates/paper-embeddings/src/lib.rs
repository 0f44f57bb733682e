//! # paper-embeddings
//!
//! Service contracts for the two model collaborators the retrieval
//! strategies depend on:
//! - [`Embedder`]: text to fixed-length vector, deterministic per model
//!   version
//! - [`Reranker`]: cross-encoder relevance of a passage to a query,
//!   normalized to [0, 1]
//!
//! Model internals are out of scope; implementations are injected where
//! they are used (no process-wide singletons). [`HttpEmbedder`] and
//! [`HttpReranker`] front a text-embeddings-inference-style server;
//! [`MockEmbedder`] and [`MockReranker`] are deterministic doubles for
//! tests.

pub mod error;
pub mod http;
pub mod mock;
pub mod model;
pub mod service;

pub use error::{EmbeddingError, RerankError};
pub use http::{HttpEmbedder, HttpReranker, HttpServiceConfig};
pub use mock::{MockEmbedder, MockReranker};
pub use model::Embedding;
pub use service::{Embedder, Reranker};
