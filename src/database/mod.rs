// Storage module
// The knowledge base's persistence capability: store chunk rows, query by
// vector similarity, query by substring match.

pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::Result;

pub use postgres::PgChunkStore;

/// Placeholder score carried by matches found via substring search, which
/// has no ranking. Distinct from any real cosine-derived similarity a
/// vector query reports.
pub const SENTINEL_SIMILARITY: f32 = 1.0;

/// A chunk ready for insertion: content plus its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A stored chunk returned from a query, with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMatch {
    pub id: Uuid,
    pub content: String,
    pub similarity: f32,
}

/// Storage capability for document chunks.
///
/// Scores from `query_by_similarity` are comparable only within one query;
/// `query_by_substring` matches all carry [`SENTINEL_SIMILARITY`].
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert a batch of chunks atomically. Either every chunk is stored
    /// or none are.
    async fn insert_chunks(&self, chunks: Vec<NewChunk>) -> Result<()>;

    /// Nearest stored chunks whose similarity to `embedding` exceeds
    /// `threshold`, best first, at most `limit` rows.
    async fn query_by_similarity(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;

    /// Chunks whose content contains any of `terms`, case-insensitively,
    /// at most `limit` rows. Results are unranked.
    async fn query_by_substring(&self, terms: &[String], limit: usize) -> Result<Vec<ChunkMatch>>;

    /// Total number of stored chunks.
    async fn count_chunks(&self) -> Result<u64>;
}
