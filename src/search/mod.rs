// Similarity search module
// Vector-store nearest-neighbor search with a substring fallback when the
// semantic pass comes back empty.


use std::sync::Arc;

use tracing::{debug, warn};

use crate::database::{ChunkMatch, ChunkStore};
use crate::embeddings::EmbeddingProvider;
use crate::{KbError, Result};

/// Cap on whitespace-split query terms folded into the substring fallback.
pub const MAX_FALLBACK_TERMS: usize = 6;

/// Hybrid search over the chunk store: semantic first, textual second.
pub struct SearchEngine {
    store: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl SearchEngine {
    #[inline]
    pub fn new(store: Arc<dyn ChunkStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    /// Search stored chunks for `query`, best matches first.
    ///
    /// The semantic pass embeds the query and asks the store for neighbors
    /// above `threshold`. When that yields nothing, the raw query is split
    /// into up to [`MAX_FALLBACK_TERMS`] terms and re-run as a
    /// case-insensitive substring query; those matches carry the sentinel
    /// similarity. A failing fallback degrades to the semantic result
    /// rather than failing the search.
    #[inline]
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkMatch>> {
        let embedding = self
            .embeddings
            .embed(query)
            .map_err(|e| KbError::Embedding(format!("Failed to embed search query: {e}")))?;

        let semantic = self
            .store
            .query_by_similarity(&embedding, threshold, limit)
            .await?;

        if !semantic.is_empty() {
            return Ok(semantic);
        }

        debug!("No semantic matches, trying text fallback for query: {query}");

        let terms: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.is_empty())
            .take(MAX_FALLBACK_TERMS)
            .map(str::to_string)
            .collect();

        if terms.is_empty() {
            return Ok(semantic);
        }

        match self.store.query_by_substring(&terms, limit).await {
            Ok(text_matches) => {
                debug!("Text fallback returned {} matches", text_matches.len());
                if text_matches.is_empty() {
                    Ok(semantic)
                } else {
                    Ok(text_matches)
                }
            }
            Err(e) => {
                warn!("Text fallback failed, returning semantic result: {e}");
                Ok(semantic)
            }
        }
    }
}
