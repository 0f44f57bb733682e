//! HTTP-backed embedding and rerank services.
//!
//! Both clients speak the text-embeddings-inference wire format: `/embed`
//! takes a batch of inputs and returns one vector per input; `/rerank`
//! takes a query plus passages and returns `(index, score)` pairs. The
//! original deployment serves bge-small-en-v1.5 embeddings and a
//! bge-reranker-v2-m3 cross-encoder behind these endpoints.

use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{EmbeddingError, RerankError};
use crate::model::Embedding;
use crate::service::{Embedder, Reranker};

/// Configuration shared by the HTTP service clients.
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Service base URL (e.g. "http://localhost:8080").
    pub base_url: String,

    /// Optional bearer token.
    pub api_key: Option<SecretString>,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum attempts per request.
    pub max_retries: u32,
}

impl HttpServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RerankEntry {
    index: usize,
    score: f32,
}

/// Embedding service client.
pub struct HttpEmbedder {
    client: Client,
    config: HttpServiceConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpServiceConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let url = format!("{}/embed", self.config.base_url);
        let request = EmbedRequest {
            inputs: texts,
            truncate: true,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingError::Service(e.to_string()))?;

        if response.status() == 429 {
            return Err(EmbeddingError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Service(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;
        let vectors = parse_embed_response(&body)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::BatchMismatch {
                sent: texts.len(),
                received: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

/// Parse an `/embed` response: one vector per input text.
fn parse_embed_response(body: &str) -> Result<Vec<Embedding>, EmbeddingError> {
    let vectors: Vec<Vec<f32>> =
        serde_json::from_str(body).map_err(|e| EmbeddingError::Parse(e.to_string()))?;
    Ok(vectors.into_iter().map(Embedding::new).collect())
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let batch = self.embed_batch(&[text.to_string()]).await?;
        batch.into_iter().next().ok_or(EmbeddingError::BatchMismatch {
            sent: 1,
            received: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            debug!(attempt = attempts, batch = texts.len(), "embedding batch");
            match self.request_embeddings(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        error!(error = %e, "embedding retries exhausted");
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!(
                                error = %e,
                                retry_in_ms = delay.as_millis(),
                                "embedding request failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            error!(error = %e, "embedding backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}

/// Cross-encoder service client.
pub struct HttpReranker {
    client: Client,
    config: HttpServiceConfig,
}

impl HttpReranker {
    pub fn new(config: HttpServiceConfig) -> Result<Self, RerankError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RerankError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn request_scores(
        &self,
        query: &str,
        passages: &[String],
    ) -> Result<Vec<f32>, RerankError> {
        let url = format!("{}/rerank", self.config.base_url);
        let request = RerankRequest {
            query,
            texts: passages,
            raw_scores: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RerankError::Service(e.to_string()))?;

        if response.status() == 429 {
            return Err(RerankError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RerankError::Service(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RerankError::Parse(e.to_string()))?;
        parse_rerank_response(&body, passages.len())
    }
}

/// Parse a `/rerank` response back into input order.
///
/// The server returns entries sorted by score; each carries the index of
/// the passage it scored.
fn parse_rerank_response(body: &str, sent: usize) -> Result<Vec<f32>, RerankError> {
    let entries: Vec<RerankEntry> =
        serde_json::from_str(body).map_err(|e| RerankError::Parse(e.to_string()))?;
    if entries.len() != sent {
        return Err(RerankError::BatchMismatch {
            sent,
            received: entries.len(),
        });
    }
    let mut scores = vec![None; sent];
    for entry in entries {
        let slot = scores
            .get_mut(entry.index)
            .ok_or_else(|| RerankError::Parse(format!("index {} out of range", entry.index)))?;
        *slot = Some(entry.score);
    }
    scores
        .into_iter()
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| RerankError::Parse("duplicate or missing passage index".to_string()))
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score_batch(
        &self,
        query: &str,
        passages: &[String],
    ) -> Result<Vec<f32>, RerankError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            debug!(attempt = attempts, passages = passages.len(), "reranking batch");
            match self.request_scores(query, passages).await {
                Ok(scores) => return Ok(scores),
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        error!(error = %e, "rerank retries exhausted");
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!(
                                error = %e,
                                retry_in_ms = delay.as_millis(),
                                "rerank request failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            error!(error = %e, "rerank backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}
