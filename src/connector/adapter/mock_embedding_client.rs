use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::application::EmbeddingClient;
use crate::domain::IndexError;

/// Deterministic stand-in for a real embedding provider (§10.4 test
/// tooling). Derives a vector from a hash of the input text rather than
/// calling out to a model, so tests never depend on network access or
/// float-equality on real model output. Counts invocations so tests can
/// assert on vector reuse (§8 scenario 5) without comparing floats.
pub struct MockEmbeddingClient {
    dimension: usize,
    calls: AtomicU64,
}

impl MockEmbeddingClient {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of times [`EmbeddingClient::embed`] has been called so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hash-seeded, deterministic float in `[-1.0, 1.0)` for `(text, index)`.
    fn component(text: &str, index: usize) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        index.hash(&mut hasher);
        let bits = hasher.finish();
        // Spread the low 24 bits across [-1.0, 1.0).
        let scaled = (bits & 0x00FF_FFFF) as f32 / 0x00FF_FFFF as f32;
        scaled * 2.0 - 1.0
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..self.dimension)
            .map(|i| Self::component(text, i))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_yields_same_vector() {
        let client = MockEmbeddingClient::new(16);
        let a = client.embed("hello world").await.unwrap();
        let b = client.embed("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let client = MockEmbeddingClient::new(16);
        let a = client.embed("alpha").await.unwrap();
        let b = client.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vector_has_requested_dimension() {
        let client = MockEmbeddingClient::new(32);
        let v = client.embed("anything").await.unwrap();
        assert_eq!(v.len(), 32);
        assert_eq!(client.dimension(), 32);
    }
}
