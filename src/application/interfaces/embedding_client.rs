use async_trait::async_trait;

use crate::domain::IndexError;

/// External embedding provider (§6 "EmbeddingClient (consumed)"): a function
/// `embed(text) -> float32[D]`. Concrete adapters live in
/// [`crate::connector::adapter`]; the indexer only ever talks to this trait.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed `text`, returning a vector of [`Self::dimension`] floats.
    /// Errors are surfaced directly (§6: "no partial results").
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;

    /// The dimension this client's vectors carry.
    fn dimension(&self) -> usize;
}
