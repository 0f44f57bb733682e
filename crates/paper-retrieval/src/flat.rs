//! Flat retrieval: nearest-neighbor over every leaf, with an optional
//! cross-encoder rerank stage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use paper_embeddings::{Embedder, Reranker};
use paper_types::{PaperNode, RetrievalHit};
use paper_vector::{CosineIndex, IndexEntry, VectorIndex};

use crate::catalog::NodeCatalog;
use crate::error::RetrievalError;
use crate::{Retriever, EMBED_BATCH_SIZE};

/// Over-fetch factor for the rerank stage: the cross-encoder sees `3k`
/// embedding candidates per query.
const RERANK_OVERFETCH: usize = 3;

/// Embed every leaf of the forest into a fresh index.
async fn index_leaves(
    forest: &[PaperNode],
    embedder: &dyn Embedder,
) -> Result<CosineIndex, RetrievalError> {
    let catalog = NodeCatalog::from_forest(forest);
    let leaves: Vec<(String, String)> = catalog
        .leaves()
        .map(|entry| (entry.id.clone(), entry.document.clone()))
        .collect();

    let mut index = CosineIndex::new();
    for batch in leaves.chunks(EMBED_BATCH_SIZE) {
        let documents: Vec<String> = batch.iter().map(|(_, doc)| doc.clone()).collect();
        let embeddings = embedder.embed_batch(&documents).await?;
        let entries = batch
            .iter()
            .zip(embeddings)
            .map(|((id, doc), embedding)| IndexEntry::new(id.clone(), embedding, doc.clone()))
            .collect();
        index.add_batch(entries)?;
        debug!(indexed = index.len(), "flat index batch added");
    }
    info!(leaves = index.len(), "flat index built");
    Ok(index)
}

/// Flat nearest-neighbor retrieval over leaf embeddings.
pub struct FlatRetriever {
    index: CosineIndex,
    embedder: Arc<dyn Embedder>,
}

impl FlatRetriever {
    /// Build the leaf index for a forest.
    pub async fn build(
        forest: &[PaperNode],
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let index = index_leaves(forest, embedder.as_ref()).await?;
        Ok(Self { index, embedder })
    }
}

#[async_trait]
impl Retriever for FlatRetriever {
    async fn query(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let query_embedding = self.embedder.embed(query).await?;
        let matches = self.index.query(&query_embedding, k, None);
        Ok(matches
            .into_iter()
            .map(|m| RetrievalHit::new(m.id, m.document))
            .collect())
    }
}

/// Flat retrieval with a cross-encoder rerank stage.
///
/// Indexing is identical to [`FlatRetriever`]; querying over-fetches `3k`
/// candidates by embedding similarity and returns the top `k` by rerank
/// score instead, correcting embedding false positives at the cost of `3k`
/// cross-encoder calls per query.
pub struct FlatRerankRetriever {
    index: CosineIndex,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
}

impl FlatRerankRetriever {
    pub async fn build(
        forest: &[PaperNode],
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self, RetrievalError> {
        let index = index_leaves(forest, embedder.as_ref()).await?;
        Ok(Self {
            index,
            embedder,
            reranker,
        })
    }
}

#[async_trait]
impl Retriever for FlatRerankRetriever {
    async fn query(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let query_embedding = self.embedder.embed(query).await?;
        let candidates = self
            .index
            .query(&query_embedding, k.saturating_mul(RERANK_OVERFETCH), None);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<String> = candidates.iter().map(|c| c.document.clone()).collect();
        let scores = self.reranker.score_batch(query, &documents).await?;

        let mut ranked: Vec<(f32, RetrievalHit)> = candidates
            .into_iter()
            .zip(scores)
            .map(|(c, score)| (score, RetrievalHit::new(c.id, c.document)))
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        Ok(ranked.into_iter().map(|(_, hit)| hit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use paper_embeddings::{MockEmbedder, MockReranker};
    use paper_types::SplitConfig;

    fn forest() -> Vec<PaperNode> {
        let config = SplitConfig::default();
        let mut trees = Vec::new();
        for (title, text) in [
            (
                "charm-paper",
                "Measurement of charm production cross sections in proton collisions.",
            ),
            (
                "detector-paper",
                "Alignment and calibration of the silicon vertex detector hardware.",
            ),
            (
                "neutrino-paper",
                "Observation of neutrino oscillation parameters at long baseline.",
            ),
        ] {
            trees.push(paper_tree::build_document_tree(title, text, &config).unwrap());
        }
        trees
    }

    #[tokio::test]
    async fn test_flat_retriever_finds_topical_leaf() {
        let retriever = FlatRetriever::build(&forest(), Arc::new(MockEmbedder::default()))
            .await
            .unwrap();
        let hits = retriever.query("charm production", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].node_id.starts_with("charm-paper"));
    }

    #[tokio::test]
    async fn test_flat_retriever_respects_k() {
        let retriever = FlatRetriever::build(&forest(), Arc::new(MockEmbedder::default()))
            .await
            .unwrap();
        let hits = retriever.query("physics", 2).await.unwrap();
        assert!(hits.len() <= 2);
        let all = retriever.query("physics", 10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_rerank_retriever_orders_by_cross_encoder() {
        let retriever = FlatRerankRetriever::build(
            &forest(),
            Arc::new(MockEmbedder::default()),
            Arc::new(MockReranker::new()),
        )
        .await
        .unwrap();
        let hits = retriever
            .query("silicon vertex detector alignment", 2)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].node_id.starts_with("detector-paper"));
    }

    #[tokio::test]
    async fn test_empty_forest_queries_cleanly() {
        let retriever = FlatRetriever::build(&[], Arc::new(MockEmbedder::default()))
            .await
            .unwrap();
        let hits = retriever.query("anything", 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
