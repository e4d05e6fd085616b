use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::EmbeddingClient;
use crate::domain::IndexError;

/// Default target: a local embedding server (e.g. an Ollama or LM Studio
/// embeddings endpoint) rather than a cloud API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const EMBEDDINGS_PATH: &str = "/api/embeddings";
const DEFAULT_MODEL: &str = "nomic-embed-text";
const DEFAULT_DIMENSION: usize = 768;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    embedding: Vec<f32>,
}

/// HTTP client for a local embedding server (§6 "EmbeddingClient (consumed)").
///
/// **Local-first defaults**: targets `http://localhost:11434` without an API
/// key. Override via environment variables to point at a remote server:
///
/// ```text
/// EMBEDDING_BASE_URL=https://embeddings.example.com
/// EMBEDDING_API_KEY=sk-...
/// EMBEDDING_MODEL=nomic-embed-text
/// EMBEDDING_DIMENSION=768
/// ```
///
/// Before each request the client sends a lightweight `HEAD /` probe with a
/// 2-second timeout, so an unreachable server fails fast instead of hanging
/// on the main request's longer timeout.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    base_url: String,
    dimension: usize,
}

impl HttpEmbeddingClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        dimension: usize,
    ) -> Self {
        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        let url = format!("{trimmed}{EMBEDDINGS_PATH}");
        let base_url = format!("{trimmed}/");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            probe_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(2))
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            url,
            base_url,
            dimension,
        }
    }

    /// Construct from environment variables with local-first defaults.
    ///
    /// | Variable               | Default                    |
    /// |------------------------|-----------------------------|
    /// | `EMBEDDING_BASE_URL`   | `http://localhost:11434`   |
    /// | `EMBEDDING_MODEL`      | `nomic-embed-text`         |
    /// | `EMBEDDING_API_KEY`    | `""` (empty)                |
    /// | `EMBEDDING_DIMENSION`  | `768`                       |
    pub fn from_env() -> Self {
        let base =
            std::env::var("EMBEDDING_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let key = std::env::var("EMBEDDING_API_KEY").unwrap_or_default();
        let dimension = std::env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DIMENSION);
        Self::new(key, model, base, dimension)
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        match self.probe_client.head(&self.base_url).send().await {
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Err(IndexError::embedding(format!(
                    "server not reachable at {}: {e}",
                    self.base_url.trim_end_matches('/')
                )));
            }
            _ => {}
        }

        let request = ApiRequest {
            model: &self.model,
            prompt: text,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| IndexError::embedding(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "HttpEmbeddingClient: API returned an error status");
            return Err(IndexError::embedding(format!("API returned {status}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| IndexError::embedding(format!("failed to parse response: {e}")))?;

        if api_response.embedding.len() != self.dimension {
            return Err(IndexError::embedding(format!(
                "expected {}-dimensional vector, got {}",
                self.dimension,
                api_response.embedding.len()
            )));
        }

        Ok(api_response.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
