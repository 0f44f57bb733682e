//! Structural-repair passes over a built paper tree.
//!
//! Three idempotent passes run once after construction, in a fixed order:
//! 1. prune sections below the minimum length
//! 2. flatten letter-style mis-splits (papers with no `\section` commands
//!    drop all content into the "Headers" bucket, which then chunks into
//!    generic subsections)
//! 3. collapse singleton-child chains, merging titles
//!
//! Pruning runs first: leftover noise would otherwise stop the other two
//! heuristics from recognizing their patterns. A final normalization step
//! re-assigns depths and restores the leaf-summary invariant, since the
//! passes re-parent and remove nodes.

use tracing::debug;

use paper_types::{PaperNode, SplitConfig};

/// Run all repair passes on a tree, in order.
pub fn repair_tree(root: &mut PaperNode, config: &SplitConfig) {
    let before = root.node_count();
    prune_small_sections(root, config.min_section_chars);
    flatten_letter_papers(root);
    collapse_singletons(root);
    normalize(root, root.depth);
    let after = root.node_count();
    if after != before {
        debug!(title = %root.title, before, after, "repaired paper tree");
    }
}

/// Remove children whose text, with all whitespace stripped, is shorter
/// than `min_chars`; recurse into the survivors. The root itself is never
/// removed.
fn prune_small_sections(node: &mut PaperNode, min_chars: usize) {
    node.children
        .retain(|child| non_whitespace_len(&child.text) >= min_chars);
    for child in &mut node.children {
        prune_small_sections(child, min_chars);
    }
}

/// A "Headers" node whose children are all generic "Subsection N" chunks is
/// the symptom of a letter-style paper: with no sectioning commands, every
/// bit of content fell into the untitled leading bucket. Splice its
/// children into the parent's child list in its place.
fn flatten_letter_papers(node: &mut PaperNode) {
    let mut i = 0;
    while i < node.children.len() {
        let is_letter_bucket = {
            let child = &node.children[i];
            child.title == "Headers"
                && !child.children.is_empty()
                && child
                    .children
                    .iter()
                    .all(|grand| grand.title.starts_with("Subsection "))
        };
        if is_letter_bucket {
            let grandchildren = std::mem::take(&mut node.children[i].children);
            node.children.splice(i..=i, grandchildren);
            // Re-examine from the same index: the spliced-in nodes are
            // "Subsection" nodes and will not match again.
        } else {
            flatten_letter_papers(&mut node.children[i]);
            i += 1;
        }
    }
}

/// Replace every child that has exactly one child of its own with that
/// grandchild, merging titles as "parent - child". Runs bottom-up so whole
/// singleton chains collapse; the root is handled by its own loop since it
/// has no parent to splice into.
fn collapse_singletons(root: &mut PaperNode) {
    collapse_children(root);
    while root.children.len() == 1 {
        let only = root.children.pop().expect("singleton child");
        absorb(root, only);
    }
}

fn collapse_children(node: &mut PaperNode) {
    for child in &mut node.children {
        collapse_children(child);
        while child.children.len() == 1 {
            let only = child.children.pop().expect("singleton child");
            absorb(child, only);
        }
    }
}

/// Replace `node` with `only`, keeping the merged title.
fn absorb(node: &mut PaperNode, only: PaperNode) {
    node.title = format!("{} - {}", node.title, only.title);
    node.text = only.text;
    node.summary = only.summary;
    node.children = only.children;
}

/// Re-assign depths after re-parenting and restore the invariant that every
/// leaf carries representative text.
fn normalize(node: &mut PaperNode, depth: usize) {
    node.depth = depth;
    if node.children.is_empty() {
        if node.summary.is_none() {
            node.summary = Some(node.text.clone());
        }
    } else {
        node.summary = None;
        for child in &mut node.children {
            normalize(child, depth + 1);
        }
    }
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(title: &str, text: &str, children: Vec<PaperNode>) -> PaperNode {
        let mut n = PaperNode::new(title, text, 0, 300);
        n.children = children;
        n
    }

    fn leaf(title: &str, text: &str) -> PaperNode {
        PaperNode::leaf(title, text, text, 0, 300)
    }

    fn long_text() -> String {
        "sufficiently long section content that clears the pruning threshold".repeat(2)
    }

    fn config() -> SplitConfig {
        SplitConfig::default()
    }

    #[test]
    fn test_prune_removes_tiny_sections() {
        let tiny = "only forty non-whitespace characters xx";
        assert!(non_whitespace_len(tiny) < 50);
        let mut root = node(
            "paper",
            &long_text(),
            vec![leaf("Keep", &long_text()), leaf("Drop", tiny), leaf("Also keep", &long_text())],
        );
        repair_tree(&mut root, &config());
        let titles: Vec<&str> = root.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Keep", "Also keep"]);
    }

    #[test]
    fn test_prune_recurses() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![
                node(
                    "Section",
                    &long_text(),
                    vec![leaf("Keep", &long_text()), leaf("Drop", "tiny")],
                ),
                leaf("Other", &long_text()),
            ],
        );
        repair_tree(&mut root, &config());
        // After pruning, "Section" has a single child and collapses into it.
        assert_eq!(root.children[0].title, "Section - Keep");
    }

    #[test]
    fn test_flatten_letter_paper() {
        let mut root = node(
            "letter",
            &long_text(),
            vec![node(
                "Headers",
                &long_text(),
                vec![
                    leaf("Subsection 0", &long_text()),
                    leaf("Subsection 1", &long_text()),
                ],
            )],
        );
        repair_tree(&mut root, &config());
        let titles: Vec<&str> = root.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Subsection 0", "Subsection 1"]);
    }

    #[test]
    fn test_headers_with_real_sections_not_flattened() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![node(
                "Headers",
                &long_text(),
                vec![
                    leaf("Chunk 0", &long_text()),
                    leaf("Chunk 1", &long_text()),
                ],
            ), leaf("Results", &long_text())],
        );
        repair_tree(&mut root, &config());
        assert_eq!(root.children[0].title, "Headers");
    }

    #[test]
    fn test_collapse_singleton_chain() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![
                node(
                    "Section",
                    &long_text(),
                    vec![node(
                        "Subsection",
                        &long_text(),
                        vec![leaf("Chunk 0", &long_text())],
                    )],
                ),
                leaf("Other", &long_text()),
            ],
        );
        repair_tree(&mut root, &config());
        assert_eq!(root.children[0].title, "Section - Subsection - Chunk 0");
        assert!(root.children[0].is_leaf());
    }

    #[test]
    fn test_collapse_singleton_root() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![node(
                "Only section",
                &long_text(),
                vec![leaf("A", &long_text()), leaf("B", &long_text())],
            )],
        );
        repair_tree(&mut root, &config());
        assert_eq!(root.title, "paper - Only section");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_depths_fixed_after_repair() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![node(
                "Headers",
                &long_text(),
                vec![
                    node(
                        "Subsection 0",
                        &long_text(),
                        vec![leaf("Chunk 0", &long_text()), leaf("Chunk 1", &long_text())],
                    ),
                    leaf("Subsection 1", &long_text()),
                ],
            )],
        );
        repair_tree(&mut root, &config());
        for (_, n) in root.iter_breadcrumbs() {
            for child in &n.children {
                assert_eq!(child.depth, n.depth + 1);
            }
        }
    }

    #[test]
    fn test_leaf_summaries_restored() {
        let mut root = node(
            "paper",
            &long_text(),
            vec![
                node("Emptied", &long_text(), vec![leaf("tiny", "x")]),
                leaf("Other", &long_text()),
            ],
        );
        repair_tree(&mut root, &config());
        for (_, n) in root.iter_breadcrumbs() {
            if n.is_leaf() {
                assert!(n.summary.is_some());
            }
        }
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut once = node(
            "paper",
            &long_text(),
            vec![
                node(
                    "Headers",
                    &long_text(),
                    vec![
                        leaf("Subsection 0", &long_text()),
                        leaf("Subsection 1", &long_text()),
                        leaf("tiny", "x"),
                    ],
                ),
                node(
                    "Section",
                    &long_text(),
                    vec![node(
                        "Sub",
                        &long_text(),
                        vec![leaf("Chunk 0", &long_text())],
                    )],
                ),
            ],
        );
        repair_tree(&mut once, &config());
        let mut twice = once.clone();
        repair_tree(&mut twice, &config());
        assert_eq!(format!("{:?}", once), format!("{:?}", twice));
    }
}
