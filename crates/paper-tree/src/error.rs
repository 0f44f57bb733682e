//! Tree construction error types.

use thiserror::Error;

/// Errors that can occur while building a paper tree.
///
/// Structural ambiguity (missing headings, malformed nesting) is not an
/// error: the splitter falls through its precedence rules instead.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The document has no non-whitespace content to decompose.
    #[error("document contains no non-whitespace content")]
    EmptyDocument,
}
