//! Embedding providers

mod hash;
mod ollama;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for turning text into fixed-length vectors.
///
/// Implementations must preserve input order and be atomic per call: a batch
/// either fully embeds or the whole call fails with
/// [`Error::EmbeddingUnavailable`](crate::Error::EmbeddingUnavailable).
/// `dimensions` is stable for the lifetime of the provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
