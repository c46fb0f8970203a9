//! Embedding providers
//!
//! - **OpenAiEmbedder**: hosted `/embeddings` endpoint
//! - **HashEmbedder**: deterministic offline vectors (not semantic)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{ZenomeError, ZenomeResult};

/// Fetches a fixed-length embedding vector for a piece of text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> ZenomeResult<Vec<f64>>;

    /// Provider description for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f64>,
}

/// OpenAI-compatible embedding client
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiEmbedder {
    /// `api_base` is the URL prefix, e.g. `https://api.openai.com/v1`
    pub fn new(api_base: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/embeddings", api_base.trim_end_matches('/')),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str, model: &str) -> ZenomeResult<Vec<f64>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ZenomeError::Auth("no API key configured".to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest { input: [text], model })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ZenomeError::from_status(status.as_u16(), body));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ZenomeError::Malformed("embedding response has no data".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Hash-seeded pseudo-embedding.
///
/// Same text and model always give the same vector; similar texts do
/// NOT give similar vectors. For offline runs and tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Synchronous core of [`EmbeddingProvider::embed`]
    pub fn embed_now(&self, text: &str, model: &str) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dimensions);
        let mut block = 0u64;
        while out.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(model.as_bytes());
            hasher.update([0u8]);
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest: [u8; 32] = hasher.finalize().into();
            for chunk in digest.chunks_exact(2) {
                if out.len() == self.dimensions {
                    break;
                }
                // Map to [-0.05, 0.05], roughly the spread of real ada-002 components
                let raw = u16::from_le_bytes([chunk[0], chunk[1]]) as f64 / u16::MAX as f64;
                out.push((raw - 0.5) * 0.1);
            }
            block += 1;
        }
        out
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(crate::DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str, model: &str) -> ZenomeResult<Vec<f64>> {
        Ok(self.embed_now(text, model))
    }

    fn name(&self) -> &str {
        "hash (offline)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_embedder_dimensions() {
        let e = HashEmbedder::new(1536).embed_now("hello", "m");
        assert_eq!(e.len(), 1536);
        let odd = HashEmbedder::new(7).embed_now("hello", "m");
        assert_eq!(odd.len(), 7);
    }

    #[test]
    fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::default();
        assert_eq!(embedder.embed_now("abc", "m"), embedder.embed_now("abc", "m"));
        assert_ne!(embedder.embed_now("abc", "m"), embedder.embed_now("abd", "m"));
        assert_ne!(embedder.embed_now("abc", "m"), embedder.embed_now("abc", "n"));
    }

    #[test]
    fn test_hash_embedder_component_range() {
        let e = HashEmbedder::default().embed_now("range check", "m");
        assert!(e.iter().all(|v| (-0.05..=0.05).contains(v)));
    }

    #[tokio::test]
    async fn test_openai_without_key_is_auth_error() {
        let embedder = OpenAiEmbedder::new("http://127.0.0.1:9", None);
        let err = embedder.embed("hi", "text-embedding-ada-002").await.unwrap_err();
        assert!(matches!(err, ZenomeError::Auth(_)));
    }

    #[test]
    fn test_endpoint_join() {
        let embedder = OpenAiEmbedder::new("https://api.openai.com/v1/", None);
        assert_eq!(embedder.endpoint(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_response_contract() {
        let parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2]}],"model":"x"}"#,
        )
        .unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2]);
    }
}
