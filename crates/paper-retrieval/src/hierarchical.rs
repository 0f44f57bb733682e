//! Hierarchical retrieval: best-first descent of the forest.
//!
//! The frontier starts at the root of every tree. Each step ranks the
//! frontier against the query, then either finalizes the best node (a
//! leaf) or replaces it with its children — so the next pick may come from
//! a different subtree if that subtree's open node is more relevant. The
//! descent is inherently sequential per query; independent queries can run
//! concurrently because frontier and cache state are per-call locals.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use paper_embeddings::{Embedder, Reranker};
use paper_types::{PaperNode, RetrievalHit};
use paper_vector::{CosineIndex, IndexEntry, VectorIndex};

use crate::catalog::NodeCatalog;
use crate::error::RetrievalError;
use crate::{Retriever, EMBED_BATCH_SIZE};

/// Embedding-similarity candidates scored per descent step in the rerank
/// variant. The cross-encoder is expensive, so only this shortlist is ever
/// scored per iteration, not the whole frontier.
const FRONTIER_CANDIDATES: usize = 15;

/// Embed every node of the forest (internal nodes included: the descent
/// ranks them by their title-path documents) into a fresh index.
async fn index_forest(
    forest: &[PaperNode],
    embedder: &dyn Embedder,
) -> Result<(CosineIndex, NodeCatalog), RetrievalError> {
    let catalog = NodeCatalog::from_forest(forest);
    let nodes: Vec<(String, String)> = catalog
        .iter()
        .map(|entry| (entry.id.clone(), entry.document.clone()))
        .collect();

    let mut index = CosineIndex::new();
    for batch in nodes.chunks(EMBED_BATCH_SIZE) {
        let documents: Vec<String> = batch.iter().map(|(_, doc)| doc.clone()).collect();
        let embeddings = embedder.embed_batch(&documents).await?;
        let entries = batch
            .iter()
            .zip(embeddings)
            .map(|((id, doc), embedding)| IndexEntry::new(id.clone(), embedding, doc.clone()))
            .collect();
        index.add_batch(entries)?;
        debug!(indexed = index.len(), "hierarchical index batch added");
    }
    info!(nodes = index.len(), roots = catalog.root_ids().len(), "hierarchical index built");
    Ok((index, catalog))
}

/// What the descent decided to do with the node chosen in one step.
enum Step {
    Finalized(RetrievalHit),
    Expanded,
    Skipped,
}

/// Resolve a chosen frontier id: finalize a leaf, expand an internal node
/// into the frontier, or skip an id the catalog does not know (recoverable
/// index/tree mismatch, never fatal).
fn resolve(
    catalog: &NodeCatalog,
    frontier: &mut HashSet<String>,
    chosen_id: &str,
) -> Step {
    frontier.remove(chosen_id);
    match catalog.get(chosen_id) {
        None => {
            warn!(id = %chosen_id, "frontier id missing from catalog, skipping");
            Step::Skipped
        }
        Some(entry) if entry.is_leaf => {
            Step::Finalized(RetrievalHit::new(entry.id.clone(), entry.document.clone()))
        }
        Some(entry) => {
            frontier.extend(entry.child_ids.iter().cloned());
            Step::Expanded
        }
    }
}

/// Best-first descent ranked by embedding similarity.
pub struct HierarchicalRetriever {
    index: CosineIndex,
    catalog: NodeCatalog,
    embedder: Arc<dyn Embedder>,
}

impl HierarchicalRetriever {
    pub async fn build(
        forest: &[PaperNode],
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let (index, catalog) = index_forest(forest, embedder.as_ref()).await?;
        Ok(Self {
            index,
            catalog,
            embedder,
        })
    }
}

#[async_trait]
impl Retriever for HierarchicalRetriever {
    async fn query(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let query_embedding = self.embedder.embed(query).await?;
        let mut frontier: HashSet<String> =
            self.catalog.root_ids().iter().cloned().collect();
        let mut results = Vec::new();

        // Every step removes one node from the frontier for good, so the
        // node count bounds the loop against runaway traversal.
        let mut steps = 0usize;
        let step_cap = self.catalog.len() + 1;

        while !frontier.is_empty() && results.len() < k && steps < step_cap {
            steps += 1;
            let best = self.index.query(&query_embedding, 1, Some(&frontier));
            let Some(best) = best.into_iter().next() else {
                // No frontier id is present in the index.
                break;
            };
            match resolve(&self.catalog, &mut frontier, &best.id) {
                Step::Finalized(hit) => results.push(hit),
                Step::Expanded | Step::Skipped => {}
            }
        }
        debug!(steps, hits = results.len(), "hierarchical descent finished");
        Ok(results)
    }
}

/// Best-first descent ranked by a cross-encoder with a per-query relevance
/// cache.
///
/// Each step pre-filters the frontier to a bounded embedding-similarity
/// shortlist, scores only uncached shortlist members with the
/// cross-encoder, then picks the highest cached relevance. The cache
/// persists across steps of one query — siblings scored but not chosen are
/// remembered, not rescored — and is freshly allocated per call.
pub struct HierarchicalRerankRetriever {
    index: CosineIndex,
    catalog: NodeCatalog,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
}

impl HierarchicalRerankRetriever {
    pub async fn build(
        forest: &[PaperNode],
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self, RetrievalError> {
        let (index, catalog) = index_forest(forest, embedder.as_ref()).await?;
        Ok(Self {
            index,
            catalog,
            embedder,
            reranker,
        })
    }
}

#[async_trait]
impl Retriever for HierarchicalRerankRetriever {
    async fn query(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let query_embedding = self.embedder.embed(query).await?;
        let mut frontier: HashSet<String> =
            self.catalog.root_ids().iter().cloned().collect();
        let mut results = Vec::new();
        let mut relevance: HashMap<String, f32> = HashMap::new();

        let mut steps = 0usize;
        let step_cap = self.catalog.len() + 1;

        while !frontier.is_empty() && results.len() < k && steps < step_cap {
            steps += 1;
            let candidates =
                self.index
                    .query(&query_embedding, FRONTIER_CANDIDATES, Some(&frontier));
            if candidates.is_empty() {
                break;
            }

            let unscored: Vec<&paper_vector::IndexMatch> = candidates
                .iter()
                .filter(|c| !relevance.contains_key(&c.id))
                .collect();
            if !unscored.is_empty() {
                let documents: Vec<String> =
                    unscored.iter().map(|c| c.document.clone()).collect();
                let scores = self.reranker.score_batch(query, &documents).await?;
                for (candidate, score) in unscored.into_iter().zip(scores) {
                    relevance.insert(candidate.id.clone(), score);
                }
            }

            let Some(chosen_id) = relevance
                .iter()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            relevance.remove(&chosen_id);
            match resolve(&self.catalog, &mut frontier, &chosen_id) {
                Step::Finalized(hit) => results.push(hit),
                Step::Expanded | Step::Skipped => {}
            }
        }
        debug!(steps, hits = results.len(), "reranked descent finished");
        Ok(results)
    }
}
