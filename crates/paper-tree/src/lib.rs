//! # paper-tree
//!
//! Recursive structural decomposition of cleaned physics-paper LaTeX into
//! hierarchical [`paper_types::PaperNode`] trees with bounded leaf sizes.
//!
//! The pipeline per document:
//! 1. [`build_tree`] recursively carves appendices, splits at sectioning
//!    commands, extracts floats, and chunks the rest under a token budget.
//! 2. [`repair_tree`] runs the structural-repair passes (prune tiny
//!    sections, flatten letter-style mis-splits, collapse singleton chains).
//!
//! [`build_document_tree`] combines both; [`build_forest`] maps it over a
//! corpus, isolating per-document failures.
//!
//! The splitter consumes *cleaned* LaTeX: macro expansion, comment and
//! bibliography stripping, and title-page truncation are a preprocessing
//! concern and are assumed to have already happened.

pub mod brace;
pub mod chunker;
pub mod error;
pub mod patterns;
pub mod repair;
pub mod splitter;

pub use chunker::{chunk_text, Chunk, TokenCounter};
pub use error::SplitError;
pub use repair::repair_tree;
pub use splitter::{build_document_tree, build_forest, build_tree};
