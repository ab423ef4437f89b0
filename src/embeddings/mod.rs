// Embeddings module
// Content chunking plus the remote embedding provider client

pub mod chunking;
pub mod openai;

use anyhow::Result;

pub use chunking::{ChunkingConfig, chunk_text};
pub use openai::OpenAiClient;

/// Remote capability that turns text into fixed-dimension vectors.
///
/// The batch call is order-preserving: output `i` always corresponds to
/// input `i`. Provider failures propagate; callers decide whether the
/// failure aborts (ingestion) or degrades (retrieval).
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
