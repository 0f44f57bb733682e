//! Token-bounded chunking with overlap.
//!
//! Splits a text span into chunks whose token counts stay within a budget,
//! carrying a bounded token overlap between consecutive chunks. Chunks
//! remember the byte offset where their fresh (non-overlap) content begins,
//! so consecutive chunks can later be regrouped into exact non-overlapping
//! spans.

use tracing::warn;

/// Token counter backed by the cl100k BPE.
///
/// Falls back to a chars/4 estimate if the encoder cannot be constructed.
pub struct TokenCounter {
    bpe: Option<tiktoken_rs::CoreBPE>,
}

impl TokenCounter {
    pub fn new() -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!(error = %e, "cl100k encoder unavailable, estimating tokens");
                None
            }
        };
        Self { bpe }
    }

    /// Count tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => (text.len() / 4).max(1),
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// One chunk of a larger span, as byte offsets into the source text.
///
/// `start..end` is the chunk's full extent including any overlap carried
/// from the previous chunk; `fresh_start..end` is the content first covered
/// by this chunk. For the first chunk the two coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
    pub fresh_start: usize,
}

impl Chunk {
    /// The chunk's text, overlap included.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Separators tried in order when subdividing an oversized span.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into chunks of at most `budget` tokens with roughly
/// `overlap` tokens of carry-over between consecutive chunks.
///
/// Boundaries fall on paragraph breaks where possible, then lines, then
/// words; a pathological unbroken run is cut at character boundaries. A
/// whitespace-only input yields no chunks; an input within budget yields
/// exactly one.
pub fn chunk_text(text: &str, counter: &TokenCounter, budget: usize, overlap: usize) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let budget = budget.max(1);
    let pieces = split_pieces(text, 0, text.len(), &SEPARATORS, counter, budget);
    let counts: Vec<usize> = pieces
        .iter()
        .map(|&(start, end)| counter.count(&text[start..end]))
        .collect();

    let mut chunks: Vec<Chunk> = Vec::new();
    // Index of the first piece not yet covered by any chunk's fresh region.
    let mut fresh = 0usize;
    while fresh < pieces.len() {
        // Walk back over the previous chunk's tail to build the overlap.
        let mut begin = fresh;
        if let Some(prev) = chunks.last() {
            let prev_first = pieces
                .iter()
                .position(|&(start, _)| start == prev.start)
                .unwrap_or(fresh);
            let mut carried = 0usize;
            while begin > prev_first && carried + counts[begin - 1] <= overlap {
                carried += counts[begin - 1];
                begin -= 1;
            }
        }

        let mut tokens: usize = counts[begin..fresh].iter().sum();
        let mut end = fresh;
        // Always take at least one fresh piece, then fill to the budget.
        while end < pieces.len() && (end == fresh || tokens + counts[end] <= budget) {
            tokens += counts[end];
            end += 1;
        }

        chunks.push(Chunk {
            start: pieces[begin].0,
            end: pieces[end - 1].1,
            fresh_start: pieces[fresh].0,
        });
        fresh = end;
    }
    chunks
}

/// Subdivide `text[start..end]` into contiguous pieces each within `budget`
/// tokens, preferring earlier separators. Pieces keep their separators, so
/// concatenating them reproduces the span byte for byte.
fn split_pieces(
    text: &str,
    start: usize,
    end: usize,
    separators: &[&str],
    counter: &TokenCounter,
    budget: usize,
) -> Vec<(usize, usize)> {
    if counter.count(&text[start..end]) <= budget {
        return vec![(start, end)];
    }
    let Some((sep, rest)) = separators.split_first() else {
        return hard_split(text, start, end, budget);
    };

    let mut boundaries = Vec::new();
    let mut cursor = start;
    for (i, _) in text[start..end].match_indices(sep) {
        let boundary = start + i + sep.len();
        if boundary > cursor && boundary < end {
            boundaries.push((cursor, boundary));
            cursor = boundary;
        }
    }
    if boundaries.is_empty() {
        return split_pieces(text, start, end, rest, counter, budget);
    }
    boundaries.push((cursor, end));

    let mut pieces = Vec::new();
    for (piece_start, piece_end) in boundaries {
        pieces.extend(split_pieces(text, piece_start, piece_end, rest, counter, budget));
    }
    pieces
}

/// Last resort: cut an unbreakable run at character boundaries, sized by the
/// chars-per-token estimate.
fn hard_split(text: &str, start: usize, end: usize, budget: usize) -> Vec<(usize, usize)> {
    let max_bytes = (budget * 4).max(1);
    let mut pieces = Vec::new();
    let mut piece_start = start;
    for (i, _) in text[start..end].char_indices() {
        let offset = start + i;
        if offset - piece_start >= max_bytes {
            pieces.push((piece_start, offset));
            piece_start = offset;
        }
    }
    if piece_start < end {
        pieces.push((piece_start, end));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> TokenCounter {
        TokenCounter::new()
    }

    #[test]
    fn test_count_basic() {
        let c = counter();
        let tokens = c.count("Hello, world!");
        assert!(tokens > 0);
        assert!(tokens < 10);
        assert_eq!(c.count(""), 0);
    }

    #[test]
    fn test_whitespace_only_yields_no_chunks() {
        assert!(chunk_text("  \n\n  ", &counter(), 50, 5).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = "A single short paragraph.";
        let chunks = chunk_text(text, &counter(), 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text(text), text);
        assert_eq!(chunks[0].fresh_start, 0);
    }

    #[test]
    fn test_long_text_splits_with_overlap() {
        let paragraph = "Measurements of charm production cross sections. ".repeat(8);
        let text = vec![paragraph; 6].join("\n\n");
        let c = counter();
        let chunks = chunk_text(&text, &c, 100, 12);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.start <= chunk.fresh_start);
            assert!(chunk.fresh_start < chunk.end);
        }
        // Fresh regions tile the input exactly.
        assert_eq!(chunks[0].fresh_start, 0);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end >= pair[1].start, true);
            assert_eq!(pair[1].fresh_start, pair[0].end);
        }
        assert_eq!(chunks.last().unwrap().end, text.len());
    }

    #[test]
    fn test_fresh_regions_cover_all_content() {
        let text = "one two three four five six seven eight nine ten ".repeat(40);
        let chunks = chunk_text(&text, &counter(), 60, 7);
        let rebuilt: String = chunks
            .iter()
            .map(|c| &text[c.fresh_start..c.end])
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_budget_respected_outside_overlap() {
        let c = counter();
        let text = "word ".repeat(500);
        let budget = 50;
        let chunks = chunk_text(&text, &c, budget, 6);
        for chunk in &chunks {
            let fresh_tokens = c.count(&text[chunk.fresh_start..chunk.end]);
            // Fresh content alone stays within budget (plus one piece slack).
            assert!(fresh_tokens <= budget + 8, "fresh tokens {}", fresh_tokens);
        }
    }

    #[test]
    fn test_unbroken_run_hard_split() {
        let text = "x".repeat(4000);
        let chunks = chunk_text(&text, &counter(), 100, 10);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.last().unwrap().end, text.len());
    }
}
