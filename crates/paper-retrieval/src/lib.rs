//! # paper-retrieval
//!
//! Four interchangeable retrieval strategies over a forest of paper trees:
//!
//! - [`FlatRetriever`]: embed every leaf, flat nearest-neighbor query
//! - [`FlatRerankRetriever`]: over-fetch 3k candidates, rerank with a
//!   cross-encoder
//! - [`HierarchicalRetriever`]: best-first descent of the tree guided by
//!   top-1 embedding similarity over the current frontier
//! - [`HierarchicalRerankRetriever`]: the same descent, ranking the
//!   frontier with a cross-encoder behind a per-query relevance cache
//!
//! Each strategy owns its vector index: built over the forest at
//! construction, dropped with the retriever. Embedding and rerank services
//! are injected as trait objects so tests can swap in deterministic
//! doubles.

pub mod catalog;
pub mod error;
pub mod flat;
pub mod hierarchical;

pub use catalog::NodeCatalog;
pub use error::RetrievalError;
pub use flat::{FlatRerankRetriever, FlatRetriever};
pub use hierarchical::{HierarchicalRerankRetriever, HierarchicalRetriever};

use async_trait::async_trait;
use paper_types::RetrievalHit;

/// Common query interface implemented by all four strategies.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` leaf hits for `query`, best first. Fewer than `k`
    /// hits is not an error.
    async fn query(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError>;
}

/// Number of documents embedded per service call while building an index.
pub const EMBED_BATCH_SIZE: usize = 250;
