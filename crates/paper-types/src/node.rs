//! Hierarchical paper tree node.
//!
//! A `PaperNode` represents a paper or a fragment of one: the document root,
//! a section or subsection, an extracted float, or a token-bounded chunk.
//! Children are owned in document order; there are no parent pointers, so the
//! tree can never form a reference cycle. Depth is assigned at construction
//! and navigation works by traversal.

use serde::{Deserialize, Serialize};

/// Separator between title components in a breadcrumb id.
pub const BREADCRUMB_SEPARATOR: &str = " / ";

/// A node in the hierarchical decomposition of a paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperNode {
    /// Human-readable label: heading text, "figure 0", "Chunk 2",
    /// "Subsection 1", "Appendix", or "Headers" for untitled leading material.
    pub title: String,

    /// The verbatim span of cleaned source text this node owns.
    pub text: String,

    /// Representative text for the node: the caption for floats, the full
    /// text for unsplittable leaves, `None` for internal nodes.
    pub summary: Option<String>,

    /// Child nodes in document order. Empty for leaves.
    pub children: Vec<PaperNode>,

    /// Hierarchy depth: 0 for a document root, parent depth + 1 below.
    pub depth: usize,

    /// Maximum token count a node's text may have before it is considered
    /// for further splitting. Inherited unchanged by children.
    pub token_budget: usize,
}

impl PaperNode {
    /// Create a node with no children and no summary yet.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        depth: usize,
        token_budget: usize,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            summary: None,
            children: Vec::new(),
            depth,
            token_budget,
        }
    }

    /// Create a leaf with an explicit summary.
    pub fn leaf(
        title: impl Into<String>,
        text: impl Into<String>,
        summary: impl Into<String>,
        depth: usize,
        token_budget: usize,
    ) -> Self {
        let mut node = Self::new(title, text, depth, token_budget);
        node.summary = Some(summary.into());
        node
    }

    /// A node is a leaf iff it has no children. Leaves are exactly the units
    /// indexed for retrieval.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Self::leaf_count).sum()
        }
    }

    /// Pre-order traversal yielding each node together with its breadcrumb
    /// id: the `" / "`-joined title path from this node down.
    ///
    /// Sibling titles are distinct by construction (headings, numbered
    /// floats, chunks, and subsections), so breadcrumbs are unique within a
    /// tree and usable as index keys.
    pub fn iter_breadcrumbs(&self) -> BreadcrumbIter<'_> {
        BreadcrumbIter {
            stack: vec![(self.title.clone(), self)],
        }
    }

    /// Render the subtree as an indented outline, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out);
        out
    }

    fn write_outline(&self, out: &mut String) {
        if self.depth > 0 {
            out.push_str(&"--".repeat(self.depth));
            out.push('>');
        }
        out.push_str(&self.title);
        out.push('\n');
        for child in &self.children {
            child.write_outline(out);
        }
    }
}

/// Pre-order iterator over `(breadcrumb, node)` pairs.
pub struct BreadcrumbIter<'a> {
    stack: Vec<(String, &'a PaperNode)>,
}

impl<'a> Iterator for BreadcrumbIter<'a> {
    type Item = (String, &'a PaperNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (crumb, node) = self.stack.pop()?;
        // Push children in reverse so the leftmost child is visited first.
        for child in node.children.iter().rev() {
            let child_crumb = format!("{}{}{}", crumb, BREADCRUMB_SEPARATOR, child.title);
            self.stack.push((child_crumb, child));
        }
        Some((crumb, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> PaperNode {
        let mut root = PaperNode::new("2212.09153", "whole document", 0, 300);
        let mut intro = PaperNode::new("Introduction", "intro text", 1, 300);
        intro
            .children
            .push(PaperNode::leaf("Chunk 0", "intro text", "intro text", 2, 300));
        root.children.push(intro);
        root.children
            .push(PaperNode::leaf("Results", "results text", "results text", 1, 300));
        root
    }

    #[test]
    fn test_is_leaf() {
        let root = sample_tree();
        assert!(!root.is_leaf());
        assert!(root.children[1].is_leaf());
    }

    #[test]
    fn test_node_and_leaf_counts() {
        let root = sample_tree();
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.leaf_count(), 2);
    }

    #[test]
    fn test_breadcrumbs_preorder() {
        let root = sample_tree();
        let crumbs: Vec<String> = root.iter_breadcrumbs().map(|(c, _)| c).collect();
        assert_eq!(
            crumbs,
            vec![
                "2212.09153",
                "2212.09153 / Introduction",
                "2212.09153 / Introduction / Chunk 0",
                "2212.09153 / Results",
            ]
        );
    }

    #[test]
    fn test_breadcrumbs_unique() {
        let root = sample_tree();
        let mut crumbs: Vec<String> = root.iter_breadcrumbs().map(|(c, _)| c).collect();
        let before = crumbs.len();
        crumbs.sort();
        crumbs.dedup();
        assert_eq!(crumbs.len(), before);
    }

    #[test]
    fn test_depth_invariant() {
        let root = sample_tree();
        for (_, node) in root.iter_breadcrumbs() {
            for child in &node.children {
                assert_eq!(child.depth, node.depth + 1);
            }
        }
    }

    #[test]
    fn test_outline_indents_by_depth() {
        let root = sample_tree();
        let outline = root.outline();
        assert!(outline.contains("2212.09153\n"));
        assert!(outline.contains("-->Introduction"));
        assert!(outline.contains("---->Chunk 0"));
    }
}
