//! Embedding providers and vector utilities.
//!
//! Defines the [`Embedder`] capability and two implementations:
//! - **[`OpenAIEmbedder`]** — calls an OpenAI-compatible `/embeddings` endpoint.
//! - **[`HashEmbedder`]** — deterministic feature hashing; offline, no credential.
//!
//! Also provides the vector helpers used by the stores:
//! - [`cosine_similarity`] — similarity between two embedding vectors
//! - [`vec_to_blob`] — encode a `Vec<f32>` as little-endian bytes for SQLite BLOB storage
//! - [`blob_to_vec`] — decode a SQLite BLOB back into a `Vec<f32>`
//!
//! # Retry Strategy
//!
//! The OpenAI embedder does not retry by default (`embedding.max_retries = 0`):
//! a failed call aborts the whole ingestion batch. When retries are enabled:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{self, EmbeddingConfig};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Turns text into fixed-length vectors.
///
/// `embed` returns exactly one vector per input text, in input order, each of
/// length [`dims`](Embedder::dims).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier stored alongside every vector (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;
    fn dims(&self) -> usize;
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Embed a single query text.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, EmbedError> {
    embedder
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EmbedError::InvalidResponse("empty embedding response".to_string()))
}

/// Create the embedder named by `config.provider`.
///
/// # Errors
///
/// Returns a configuration error for unknown providers, or when the `openai`
/// provider is selected and `OPENAI_API_KEY` is missing.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "hash" => Ok(Arc::new(HashEmbedder::new(config.dims))),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}

// ============ OpenAI ============

/// Embedder backed by `POST {base_url}/embeddings`.
///
/// Inputs are sent in batches of `embedding.batch_size`; the first failing
/// batch fails the whole call.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
    batch_size: usize,
    max_retries: u32,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Self::with_api_key(config, config::api_key()?)
    }

    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dims: config.dims,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    "retrying embedding request"
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(EmbedError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let parsed: EmbeddingResponse = response.json().await?;
                return order_embeddings(parsed, texts.len(), self.dims);
            }

            let text = response.text().await.unwrap_or_default();
            let err = EmbedError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            };
            if status.as_u16() == 429 || status.is_server_error() {
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_err.unwrap_or_else(|| {
            EmbedError::InvalidResponse("embedding failed after retries".to_string())
        }))
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(batch = batch.len(), model = %self.model, "embedding batch");
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pull `error.message` out of an OpenAI-style error body, or return the body as-is.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Restore input order and check counts and dimensions.
fn order_embeddings(
    mut response: EmbeddingResponse,
    expected_len: usize,
    dims: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    if response.data.len() != expected_len {
        return Err(EmbedError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected_len,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|item| item.index);

    let mut out = Vec::with_capacity(expected_len);
    for item in response.data {
        if item.embedding.len() != dims {
            return Err(EmbedError::DimensionMismatch {
                expected: dims,
                actual: item.embedding.len(),
            });
        }
        out.push(item.embedding);
    }
    Ok(out)
}

// ============ Hash ============

/// Offline embedder: lower-cased word tokens are hashed into `dims` buckets
/// and the counts are L2-normalised.
///
/// Identical texts always produce identical vectors, so a chunk's own text is
/// its best match.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let mut first = [0u8; 8];
            first.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(first) % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

// ============ Vector helpers ============

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// ```rust
/// use jobjob::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB produced by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, zero vectors, or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
