//! Tree construction configuration.

use serde::{Deserialize, Serialize};

/// Knobs governing how a paper is decomposed into a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Maximum token count a span may have before it is split further.
    pub token_budget: usize,

    /// Maximum number of children a chunking step may produce. Overflow is
    /// grouped into intermediate "Subsection i" nodes instead.
    pub max_children: usize,

    /// Minimum non-whitespace length a section must have to survive the
    /// pruning pass.
    pub min_section_chars: usize,

    /// Rough chars-per-token estimate used when a cheap pre-check is enough.
    pub chars_per_token: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            token_budget: 300,
            max_children: 8,
            min_section_chars: 50,
            chars_per_token: 4,
        }
    }
}

impl SplitConfig {
    /// Token overlap carried between consecutive chunks.
    pub fn overlap_tokens(&self) -> usize {
        self.token_budget / 8
    }

    /// Character estimate of the token budget.
    pub fn budget_chars(&self) -> usize {
        self.token_budget * self.chars_per_token
    }

    /// Override the token budget.
    pub fn with_token_budget(mut self, tokens: usize) -> Self {
        self.token_budget = tokens;
        self
    }

    /// Override the minimum section length.
    pub fn with_min_section_chars(mut self, chars: usize) -> Self {
        self.min_section_chars = chars;
        self
    }
}
