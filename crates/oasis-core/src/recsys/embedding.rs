//! Embedding backend used by the twhin/twitter RecEngine strategies.
//!
//! The embedding model is treated as an external `texts → vectors`
//! function. We expose that boundary as a trait so the twhin strategy stays
//! testable offline (via [`HashEmbeddingProvider`]) while production code can
//! plug in an HTTP-backed provider.

use crate::error::EmbeddingError;

/// Converts batches of text into fixed-length vectors.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError>;
}

/// Deterministic, dependency-free embedding provider for tests and offline
/// runs: hashes each text into a fixed-dimension vector. Not meaningful as a
/// semantic embedding, but stable and cheap, and it makes cosine-similarity
/// math exercisable without a network call.
pub struct HashEmbeddingProvider {
    dims: usize,
}

impl HashEmbeddingProvider {
    /// Build a provider producing vectors of `dims` dimensions.
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Ok(texts.iter().map(|t| hash_embed(t, self.dims)).collect())
    }
}

fn hash_embed(text: &str, dims: usize) -> Vec<f64> {
    use std::hash::{Hash, Hasher};
    let mut vector = vec![0.0_f64; dims];
    for (i, token) in text.split_whitespace().enumerate() {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        token.hash(&mut hasher);
        (i as u64).hash(&mut hasher);
        let h = hasher.finish();
        let slot = (h as usize) % dims;
        let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
        vector[slot] += sign;
    }
    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// HTTP-backed embedding provider for production use (e.g. an OpenAI-style
/// embeddings endpoint).
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbeddingProvider {
    /// Build a provider targeting `base_url` (an embeddings endpoint root).
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(serde::Deserialize)]
struct EmbedResponseItem {
    embedding: Vec<f64>,
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedResponseItem>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(EmbeddingError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let parsed: EmbedResponse = response.json().await?;
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

/// Cosine similarity between two equal-length vectors. Returns `0.0` for a
/// zero vector on either side rather than dividing by zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
