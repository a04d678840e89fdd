// Embeddings module
// Provider trait plus the Ollama-backed implementation

pub mod ollama;

use anyhow::Result;

pub use ollama::{DEFAULT_EMBEDDING_DIMENSION, OllamaClient};

/// Batch size for providers that do not configure their own
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Turns text into fixed-length vectors.
///
/// Implementations must be deterministic for identical input, and the same
/// provider (same model, same dimension) must embed both the corpus and queries.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model, reported by health checks
    fn model_id(&self) -> &str;

    /// Length of every vector returned by [`EmbeddingProvider::encode`]
    fn dimension(&self) -> usize;

    /// Number of texts callers should hand to one [`EmbeddingProvider::encode`]
    /// call when embedding a large collection
    #[inline]
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Embed `texts`, returning one vector per input in the same order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    #[inline]
    fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding provider returned no vector"))
    }
}
