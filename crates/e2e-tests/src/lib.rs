//! Shared fixtures for the end-to-end tests: realistic LaTeX documents,
//! hand-built forests with known shapes, and instrumented service doubles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use paper_embeddings::{Embedder, EmbeddingError, RerankError, Reranker};
use paper_types::{PaperNode, SplitConfig};

/// A cleaned physics-paper-style document with leading abstract material,
/// three sections (one carrying a figure and a subsection), and a trailing
/// appendix.
pub fn sample_paper_latex() -> String {
    let para = |topic: &str| {
        format!(
            "The {topic} is described in detail, with emphasis on the event \
             selection criteria and the treatment of combinatorial background. ",
        )
        .repeat(3)
    };
    format!(
        "This letter reports a measurement of charm meson production in \
         proton-proton collisions, using data collected during the second run.\n\
         \\section{{Introduction}}\n{intro}\n\
         \\section{{Detector and simulation}}\n{det}\n\
         \\begin{{figure}}\\includegraphics{{mass.pdf}}\\caption{{Invariant mass distribution}}\\end{{figure}}\n\
         \\subsection{{Trigger}}\n{trig}\n\
         \\section{{Results}}\n{res}\n\
         \\appendix\nSupplementary tables of measured cross sections in all rapidity bins. \
         The correlation matrices are provided for each bin separately.",
        intro = para("analysis strategy"),
        det = para("spectrometer geometry"),
        trig = para("trigger configuration"),
        res = para("measured cross section"),
    )
}

/// Split configuration small enough that the fixtures exercise chunking.
pub fn test_config() -> SplitConfig {
    SplitConfig::default().with_token_budget(60)
}

/// Three topically distinct single-leaf papers for flat retrieval tests.
pub fn topical_documents() -> Vec<(String, String)> {
    vec![
        (
            "charm-production".to_string(),
            "Measurement of charm meson production cross sections in forward \
             rapidity proton collisions at the highest collision energies."
                .to_string(),
        ),
        (
            "detector-alignment".to_string(),
            "Alignment and calibration procedures for the silicon vertex \
             locator and the downstream tracking stations."
                .to_string(),
        ),
        (
            "neutrino-oscillation".to_string(),
            "Observation of neutrino oscillation parameters with a long \
             baseline accelerator beam exposure."
                .to_string(),
        ),
    ]
}

/// Query whose best leaf in [`deep_forest`] sits three internal levels
/// deep. Each path component adds exactly one of its terms, so every
/// descent step has a strictly dominant choice for both the bag-of-words
/// embedder and the term-overlap reranker.
pub const DEEP_QUERY: &str = "polarization helicity amplitude interference";

/// Breadcrumb id of the leaf [`DEEP_QUERY`] must reach.
pub const DEEP_TARGET: &str =
    "polarization-paper / helicity analysis / amplitude fits / Chunk 0";

/// A forest with one deep, structured paper and two flat decoys that share
/// no vocabulary with [`DEEP_QUERY`].
pub fn deep_forest() -> Vec<PaperNode> {
    let budget = SplitConfig::default().token_budget;
    let leaf = |title: &str, text: &str, depth: usize| -> PaperNode {
        PaperNode::leaf(title, text, text, depth, budget)
    };
    let node = |title: &str, depth: usize, children: Vec<PaperNode>| -> PaperNode {
        let mut n = PaperNode::new(title, "", depth, budget);
        n.children = children;
        n
    };

    let target = node(
        "polarization-paper",
        0,
        vec![
            node(
                "helicity analysis",
                1,
                vec![
                    node(
                        "amplitude fits",
                        2,
                        vec![
                            leaf(
                                "Chunk 0",
                                "interference pattern observed in the angular decomposition",
                                3,
                            ),
                            leaf("Chunk 1", "systematic checks of the fit stability", 3),
                        ],
                    ),
                    leaf("acceptance", "acceptance maps in bins of momentum", 2),
                ],
            ),
            leaf("summary", "concluding remarks and outlook for future runs", 1),
        ],
    );

    let decoy_a = node(
        "dijet-paper",
        0,
        vec![
            leaf("jets", "dijet invariant spectra with cone clustering", 1),
            leaf("gluons", "gluon splitting fractions at wide angles", 1),
        ],
    );
    let decoy_b = node(
        "cosmics-paper",
        0,
        vec![leaf("muon flux", "cosmic muon flux during shutdown periods", 1)],
    );
    vec![target, decoy_a, decoy_b]
}

/// Embedder double that always fails, for error-path tests.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<paper_embeddings::Embedding, EmbeddingError> {
        Err(EmbeddingError::Service("service unavailable".to_string()))
    }
}

/// Reranker wrapper counting how often each passage is scored, to verify
/// the relevance cache never rescores a node within one query.
pub struct CountingReranker<R> {
    inner: R,
    scored: Mutex<HashMap<String, usize>>,
}

impl<R> CountingReranker<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scored: Mutex::new(HashMap::new()),
        }
    }

    /// Highest number of times any single passage was scored.
    pub fn max_scorings(&self) -> usize {
        self.scored
            .lock()
            .expect("counter lock")
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl<R: Reranker> Reranker for CountingReranker<R> {
    async fn score_batch(
        &self,
        query: &str,
        passages: &[String],
    ) -> Result<Vec<f32>, RerankError> {
        {
            let mut scored = self.scored.lock().expect("counter lock");
            for passage in passages {
                *scored.entry(passage.clone()).or_insert(0) += 1;
            }
        }
        self.inner.score_batch(query, passages).await
    }
}
