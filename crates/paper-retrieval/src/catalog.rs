//! Forest flattening for index construction and traversal.

use std::collections::HashMap;

use paper_types::{PaperNode, BREADCRUMB_SEPARATOR};

/// One node of the forest, flattened for retrieval: its breadcrumb id, the
/// document string indexed for it, and enough structure to drive the
/// hierarchical descent.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Breadcrumb id (unique across the forest).
    pub id: String,
    /// Indexed document text: `"{id} \n {summary}"`. Internal nodes carry
    /// no summary, so their document is the title path alone.
    pub document: String,
    /// Breadcrumb ids of the node's children, in document order.
    pub child_ids: Vec<String>,
    /// Whether the node is a leaf (the unit of retrieval).
    pub is_leaf: bool,
}

/// Lookup structure over a flattened forest.
pub struct NodeCatalog {
    entries: HashMap<String, CatalogEntry>,
    order: Vec<String>,
    root_ids: Vec<String>,
}

impl NodeCatalog {
    /// Flatten a forest into breadcrumb-keyed entries.
    pub fn from_forest(forest: &[PaperNode]) -> Self {
        let mut entries = HashMap::new();
        let mut order = Vec::new();
        let mut root_ids = Vec::new();
        for tree in forest {
            root_ids.push(tree.title.clone());
            for (crumb, node) in tree.iter_breadcrumbs() {
                let document = format!(
                    "{} \n {}",
                    crumb,
                    node.summary.as_deref().unwrap_or_default()
                );
                let child_ids = node
                    .children
                    .iter()
                    .map(|child| format!("{}{}{}", crumb, BREADCRUMB_SEPARATOR, child.title))
                    .collect();
                entries.insert(
                    crumb.clone(),
                    CatalogEntry {
                        id: crumb.clone(),
                        document,
                        child_ids,
                        is_leaf: node.is_leaf(),
                    },
                );
                order.push(crumb);
            }
        }
        Self {
            entries,
            order,
            root_ids,
        }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// All entries in forest pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Leaf entries only, in forest pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.iter().filter(|entry| entry.is_leaf)
    }

    /// Breadcrumb ids of the forest roots (depth 0).
    pub fn root_ids(&self) -> &[String] {
        &self.root_ids
    }

    /// Total number of nodes across the forest.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Vec<PaperNode> {
        let mut paper = PaperNode::new("paper-1", "full text", 0, 300);
        let mut section = PaperNode::new("Results", "results text", 1, 300);
        section.children.push(PaperNode::leaf(
            "Chunk 0",
            "yields measured",
            "yields measured",
            2,
            300,
        ));
        paper.children.push(section);
        paper
            .children
            .push(PaperNode::leaf("figure 0", "\\begin{figure}...", "Plot of X", 1, 300));

        let other = PaperNode::leaf("paper-2", "short note", "short note", 0, 300);
        vec![paper, other]
    }

    #[test]
    fn test_catalog_covers_every_node() {
        let catalog = NodeCatalog::from_forest(&forest());
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get("paper-1 / Results / Chunk 0").is_some());
        assert!(catalog.get("paper-2").is_some());
    }

    #[test]
    fn test_root_ids() {
        let catalog = NodeCatalog::from_forest(&forest());
        assert_eq!(catalog.root_ids(), &["paper-1", "paper-2"]);
    }

    #[test]
    fn test_leaf_documents_carry_summary() {
        let catalog = NodeCatalog::from_forest(&forest());
        let figure = catalog.get("paper-1 / figure 0").unwrap();
        assert!(figure.is_leaf);
        assert_eq!(figure.document, "paper-1 / figure 0 \n Plot of X");
    }

    #[test]
    fn test_internal_documents_are_title_paths() {
        let catalog = NodeCatalog::from_forest(&forest());
        let results = catalog.get("paper-1 / Results").unwrap();
        assert!(!results.is_leaf);
        assert_eq!(results.document, "paper-1 / Results \n ");
        assert_eq!(results.child_ids, vec!["paper-1 / Results / Chunk 0"]);
    }

    #[test]
    fn test_leaves_iterator() {
        let catalog = NodeCatalog::from_forest(&forest());
        let leaf_ids: Vec<&str> = catalog.leaves().map(|e| e.id.as_str()).collect();
        assert_eq!(
            leaf_ids,
            vec![
                "paper-1 / Results / Chunk 0",
                "paper-1 / figure 0",
                "paper-2",
            ]
        );
    }
}
