//! Retrieval result types.

use serde::{Deserialize, Serialize};

/// One ranked answer from a retriever: the breadcrumb id of a leaf node and
/// the document string that was indexed for it (`"{id} \n {summary}"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Breadcrumb id of the matched leaf.
    pub node_id: String,

    /// Indexed document text for the leaf.
    pub text: String,
}

impl RetrievalHit {
    pub fn new(node_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_roundtrips_through_json() {
        let hit = RetrievalHit::new("paper / Results", "paper / Results \n measured yields");
        let json = serde_json::to_string(&hit).unwrap();
        let back: RetrievalHit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hit);
    }
}
