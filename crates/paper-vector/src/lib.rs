//! # paper-vector
//!
//! Ephemeral vector index for the retrieval strategies.
//!
//! The index is a scoped resource: a retriever builds one over its forest
//! at construction and the backing collections drop with it. Queries can be
//! restricted to an exact id subset, which the hierarchical strategies use
//! to rank only their current frontier; results outside the restriction
//! set are never returned.
//!
//! At forest scale (thousands of nodes, not millions) an exact brute-force
//! cosine scan is both simpler and stronger than an approximate ANN
//! structure: frontier-restricted top-1 selection must be exact for the
//! best-first descent to be meaningful.

pub mod cosine;
pub mod error;
pub mod index;

pub use cosine::CosineIndex;
pub use error::IndexError;
pub use index::{IndexEntry, IndexMatch, VectorIndex};
