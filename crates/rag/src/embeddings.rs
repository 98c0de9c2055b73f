//! Text Embeddings
//!
//! - [`OpenAiEmbedder`]: OpenAI-compatible `/embeddings` endpoint
//! - [`SimpleEmbedder`]: deterministic hashed bag-of-words, no model required

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use voice_agent_config::constants::{endpoints, rag, timeouts};
use voice_agent_config::ProvidersConfig;
use voice_agent_core::Embedder;

use crate::RagError;

/// OpenAI embedding configuration
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API base URL (without `/embeddings`)
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Expected embedding dimension
    pub embedding_dim: usize,
    /// Bearer key
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::PROVIDER_BASE_URL.to_string(),
            model: rag::EMBEDDING_MODEL.to_string(),
            embedding_dim: rag::EMBEDDING_DIMENSION,
            api_key: None,
            timeout: Duration::from_secs(timeouts::PROVIDER_SECS),
        }
    }
}

impl From<&ProvidersConfig> for OpenAiEmbeddingConfig {
    fn from(providers: &ProvidersConfig) -> Self {
        Self {
            endpoint: providers.base_url.clone(),
            model: providers.embedding_model.clone(),
            embedding_dim: providers.embedding_dimension,
            api_key: providers.resolved_api_key(),
            timeout: Duration::from_secs(providers.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// OpenAI-compatible embedder
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbeddingConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.endpoint.trim_end_matches('/'))
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let mut builder = self.client.post(self.embeddings_url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Embedding API error: {} - {}",
                status, text
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        let embedding = embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))?;

        if embedding.len() != self.config.embedding_dim {
            return Err(RagError::Embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.config.model,
                embedding.len(),
                self.config.embedding_dim
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> voice_agent_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dim
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Simple embedder for testing and offline runs (no model required)
///
/// Each lowercased word is hashed (FNV-1a) into a bucket; the count vector
/// is L2-normalized. Texts sharing words score high under cosine.
#[derive(Debug, Clone)]
pub struct SimpleEmbedder {
    embedding_dim: usize,
}

impl SimpleEmbedder {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim: embedding_dim.max(1),
        }
    }

    /// Generate a hash-based embedding
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.embedding_dim];

        for word in text.split_whitespace() {
            let idx = (fnv1a(&word.to_lowercase()) % self.embedding_dim as u64) as usize;
            embedding[idx] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed(&self, text: &str) -> voice_agent_core::Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }

    fn model_name(&self) -> &str {
        "simple-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_simple_embedder() {
        let embedder = SimpleEmbedder::new(384);
        let embedding = embedder.embed_text("Hello world");

        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_simple_embedder_deterministic_and_similar() {
        let embedder = SimpleEmbedder::new(256);
        let a = embedder.embed_text("museum opening hours");
        let b = embedder.embed_text("Museum opening hours");
        let c = embedder.embed_text("parking lot");

        assert_eq!(a, b);
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_simple_embedder_empty_text() {
        let embedding = SimpleEmbedder::new(8).embed_text("   ");
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_config_default() {
        let config = OpenAiEmbeddingConfig::default();
        assert_eq!(config.model, "text-embedding-ada-002");
        assert_eq!(config.embedding_dim, 1536);
    }

    #[test]
    fn test_embeddings_url() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbeddingConfig {
            endpoint: "http://localhost:9999/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(embedder.embeddings_url(), "http://localhost:9999/v1/embeddings");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_embedding_error() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbeddingConfig {
            endpoint: "http://127.0.0.1:9/v1".to_string(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();

        let result = embedder.embed("hello").await;
        assert!(matches!(
            result,
            Err(voice_agent_core::Error::EmbeddingService(_))
        ));
    }
}
