//! Recursive decomposition of a cleaned LaTeX span into a paper tree.
//!
//! Rules are tried in strict precedence order on every span; the first one
//! that applies wins:
//! 1. appendix carve-out (the last appendix marker splits the tail off)
//! 2. heading split at the shallowest sectioning level with a match
//! 3. float extraction (figure/table/sidewaystable become atomic leaves)
//! 4. token-bounded chunking with overlap, fan-out capped by grouping
//!    overflow chunks into intermediate "Subsection i" nodes
//!
//! A span with no structure that fits the token budget becomes a leaf.
//! Structural ambiguity never raises; degenerate spans are left for the
//! repair passes.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use paper_types::{PaperNode, SplitConfig};

use crate::chunker::{chunk_text, Chunk, TokenCounter};
use crate::error::SplitError;
use crate::patterns;
use crate::repair::repair_tree;

/// Build the raw decomposition tree for one paper. Never fails: a document
/// with no recognizable structure becomes a single leaf.
pub fn build_tree(title: &str, text: &str, config: &SplitConfig) -> PaperNode {
    let counter = TokenCounter::new();
    let root = build_node(title, text, 0, config, &counter);
    debug!(
        title = %root.title,
        nodes = root.node_count(),
        leaves = root.leaf_count(),
        "built paper tree"
    );
    root
}

/// Build and repair the tree for one paper.
///
/// Errors only on a document with no non-whitespace content; everything
/// else is handled by precedence fallback and the repair passes.
pub fn build_document_tree(
    title: &str,
    text: &str,
    config: &SplitConfig,
) -> Result<PaperNode, SplitError> {
    if text.trim().is_empty() {
        return Err(SplitError::EmptyDocument);
    }
    let mut root = build_tree(title, text, config);
    repair_tree(&mut root, config);
    Ok(root)
}

/// Build trees for a corpus of `(title, cleaned text)` documents.
///
/// A document that fails to build is logged and skipped; one bad paper
/// never aborts the rest of the corpus.
pub fn build_forest(documents: &[(String, String)], config: &SplitConfig) -> Vec<PaperNode> {
    let mut forest = Vec::with_capacity(documents.len());
    for (title, text) in documents {
        match build_document_tree(title, text, config) {
            Ok(tree) => forest.push(tree),
            Err(e) => warn!(title = %title, error = %e, "skipping document"),
        }
    }
    info!(
        documents = documents.len(),
        trees = forest.len(),
        "built forest"
    );
    forest
}

fn build_node(
    title: &str,
    text: &str,
    depth: usize,
    config: &SplitConfig,
    counter: &TokenCounter,
) -> PaperNode {
    let mut node = PaperNode::new(title, text, depth, config.token_budget);
    node.children = split_span(text, depth, config, counter);
    if node.children.is_empty() && node.summary.is_none() {
        // Retrieval-time invariant: every leaf carries representative text.
        node.summary = Some(node.text.clone());
    }
    node
}

fn split_span(
    text: &str,
    depth: usize,
    config: &SplitConfig,
    counter: &TokenCounter,
) -> Vec<PaperNode> {
    // 1. Appendix carve-out: the appendix is never merged with ordinary
    // chunks; the marker itself is consumed so the carve cannot recurse.
    if let Some(appendix) = patterns::find_appendix(text) {
        let body = &text[..appendix.start];
        let tail = &text[appendix.end..];
        let mut children = split_span(body, depth, config, counter);
        if children.is_empty() && !body.trim().is_empty() {
            children.push(build_node("Headers", body, depth + 1, config, counter));
        }
        children.push(build_node("Appendix", tail, depth + 1, config, counter));
        return children;
    }

    // 2. Heading split at the shallowest level that matches, probing no
    // deeper than one level past the current depth.
    let deepest = (depth + 1).min(patterns::HEADING_LEVELS - 1);
    for level in 0..=deepest {
        let headings = patterns::find_headings(text, level);
        if !headings.is_empty() {
            return split_at_headings(text, &headings, depth, config, counter);
        }
    }

    // 3 + 4. Floats, then token-bounded chunking of what remains.
    split_leafward(text, depth, config, counter)
}

/// Partition a span at its heading commands. Material before the first
/// heading becomes a "Headers" child; the commands themselves are consumed
/// (their text lives on as the child titles).
fn split_at_headings(
    text: &str,
    headings: &[patterns::HeadingMatch],
    depth: usize,
    config: &SplitConfig,
    counter: &TokenCounter,
) -> Vec<PaperNode> {
    let mut children = Vec::new();
    let mut start = 0usize;
    let mut title = "Headers".to_string();
    for heading in headings {
        let span = &text[start..heading.start];
        if !span.trim().is_empty() {
            children.push(build_node(&title, span, depth + 1, config, counter));
        }
        start = heading.end;
        title.clone_from(&heading.title);
    }
    let span = &text[start..];
    if !span.trim().is_empty() {
        children.push(build_node(&title, span, depth + 1, config, counter));
    }
    children
}

/// Extract floats as atomic leaves, then chunk the remaining text under the
/// token budget.
fn split_leafward(
    text: &str,
    depth: usize,
    config: &SplitConfig,
    counter: &TokenCounter,
) -> Vec<PaperNode> {
    let floats = patterns::find_floats(text);
    let mut children = Vec::new();
    let mut remaining = String::new();

    if floats.is_empty() {
        remaining.push_str(text);
    } else {
        let mut ordinals: HashMap<String, usize> = HashMap::new();
        let mut cursor = 0usize;
        for float in &floats {
            remaining.push_str(&text[cursor..float.start]);
            cursor = float.end;

            let span = &text[float.start..float.end];
            let name = float.env.trim_end_matches('*').to_string();
            let ordinal = ordinals.entry(name.clone()).or_insert(0);
            let summary = float
                .caption
                .clone()
                .unwrap_or_else(|| span.to_string());
            children.push(PaperNode::leaf(
                format!("{} {}", name, ordinal),
                span,
                summary,
                depth + 1,
                config.token_budget,
            ));
            *ordinal += 1;
        }
        remaining.push_str(&text[cursor..]);
    }

    // Spans that fit the budget in one chunk terminate the recursion,
    // unless floats were pulled out (then the remainder must still become
    // its own leaf to keep the text covered).
    let needs_chunking =
        !floats.is_empty() || counter.count(&remaining) > config.token_budget;
    if !needs_chunking {
        return children;
    }

    let chunks = chunk_text(
        &remaining,
        counter,
        config.token_budget,
        config.overlap_tokens(),
    );
    match chunks.len() {
        0 => {}
        1 => {
            let only = chunks[0].text(&remaining);
            if !floats.is_empty() || non_whitespace_len(only) > config.min_section_chars {
                children.push(PaperNode::leaf(
                    "Chunk 0",
                    only,
                    only,
                    depth + 1,
                    config.token_budget,
                ));
            }
        }
        n if n <= config.max_children => {
            for (i, chunk) in chunks.iter().enumerate() {
                let body = chunk.text(&remaining);
                children.push(PaperNode::leaf(
                    format!("Chunk {}", i),
                    body,
                    body,
                    depth + 1,
                    config.token_budget,
                ));
            }
        }
        _ => {
            children.extend(group_into_subsections(
                &remaining, &chunks, depth, config, counter,
            ));
        }
    }
    children
}

/// Cap fan-out: fold an overflowing chunk sequence into at most
/// `max_children` consecutive groups over realigned non-overlapping spans,
/// each split further on its own.
fn group_into_subsections(
    remaining: &str,
    chunks: &[Chunk],
    depth: usize,
    config: &SplitConfig,
    counter: &TokenCounter,
) -> Vec<PaperNode> {
    let n = chunks.len();
    let per_group = config.max_children.saturating_sub(1).max(1);
    let groups = n.div_ceil(per_group).min(config.max_children).max(1);
    debug!(chunks = n, groups, depth, "grouping chunk overflow");

    let base = n / groups;
    let extra = n % groups;
    let mut children = Vec::with_capacity(groups);
    let mut first = 0usize;
    let mut start = 0usize;
    for g in 0..groups {
        let size = base + usize::from(g < extra);
        let next_first = first + size;
        let end = if next_first >= n {
            remaining.len()
        } else {
            chunks[next_first].fresh_start
        };
        children.push(build_node(
            &format!("Subsection {}", g),
            &remaining[start..end],
            depth + 1,
            config,
            counter,
        ));
        first = next_first;
        start = end;
    }
    children
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
