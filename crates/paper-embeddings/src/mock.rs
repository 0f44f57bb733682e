//! Deterministic service doubles for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{EmbeddingError, RerankError};
use crate::model::Embedding;
use crate::service::{Embedder, Reranker};

/// Deterministic bag-of-words embedder.
///
/// Each distinct lowercased word gets its own vector component, assigned on
/// first sight; the per-text word counts are then unit-normalized. Texts
/// sharing vocabulary land close in cosine space and unrelated texts score
/// zero, which is all the retrieval tests need. Component assignment is
/// per-instance state, so build and queries must go through the same
/// embedder — exactly how the retrievers hold their injected service.
pub struct MockEmbedder {
    dimension: usize,
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl MockEmbedder {
    /// Vector dimension caps the distinct vocabulary; words past `dimension`
    /// share its last component.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vocabulary: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut buckets = vec![0.0f32; self.dimension];
        let mut vocabulary = self.vocabulary.lock().expect("vocabulary lock");
        for word in tokenize(text) {
            let next = vocabulary.len();
            let slot = *vocabulary.entry(word).or_insert(next);
            buckets[slot.min(self.dimension - 1)] += 1.0;
        }
        Ok(Embedding::new(buckets))
    }
}

/// Term-overlap reranker: the fraction of query terms present in the
/// passage, which is already a relevance score in [0, 1].
pub struct MockReranker;

impl MockReranker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for MockReranker {
    async fn score_batch(
        &self,
        query: &str,
        passages: &[String],
    ) -> Result<Vec<f32>, RerankError> {
        let terms = tokenize(query);
        Ok(passages
            .iter()
            .map(|passage| term_overlap(passage, &terms))
            .collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(|w| w.to_lowercase())
        .collect()
}

fn term_overlap(passage: &str, terms: &[String]) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let words = tokenize(passage);
    let matched = terms.iter().filter(|t| words.contains(t)).count();
    matched as f32 / terms.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::default();
        let a = embedder.embed("charm production cross section").await.unwrap();
        let b = embedder.embed("charm production cross section").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = MockEmbedder::default();
        let query = embedder.embed("charm production").await.unwrap();
        let close = embedder
            .embed("measurement of charm production yields")
            .await
            .unwrap();
        let far = embedder
            .embed("detector alignment calibration procedure")
            .await
            .unwrap();
        assert!(query.cosine_similarity(&close) > query.cosine_similarity(&far));
    }

    #[tokio::test]
    async fn test_mock_batch_preserves_order() {
        let embedder = MockEmbedder::default();
        let texts = vec!["alpha beta".to_string(), "gamma delta".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        let single = embedder.embed("gamma delta").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], single);
    }

    #[tokio::test]
    async fn test_mock_rerank_overlap() {
        let reranker = MockReranker::new();
        let scores = reranker
            .score_batch(
                "charm production",
                &[
                    "charm production measurement".to_string(),
                    "charm quark studies".to_string(),
                    "detector alignment".to_string(),
                ],
            )
            .await
            .unwrap();
        assert_eq!(scores[0], 1.0);
        assert_eq!(scores[1], 0.5);
        assert_eq!(scores[2], 0.0);
    }

    #[tokio::test]
    async fn test_mock_rerank_scores_bounded() {
        let reranker = MockReranker::new();
        let scores = reranker
            .score_batch("query terms here", &["some passage".to_string()])
            .await
            .unwrap();
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
