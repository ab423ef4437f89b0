// Ingestion module
// Turns extracted document text into stored, embedded chunks.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::{ChunkStore, NewChunk};
use crate::embeddings::chunking::{ChunkingConfig, chunk_text};
use crate::embeddings::EmbeddingProvider;
use crate::{KbError, Result};

/// Summary of a completed ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks_stored: usize,
}

/// Ingests extracted text: chunk, embed, store.
///
/// Ingestion is atomic: a provider or storage failure aborts the whole
/// document with nothing written.
pub struct Ingestor {
    store: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
}

impl Ingestor {
    #[inline]
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            chunking,
        }
    }

    /// Ingest the extracted text of one document.
    ///
    /// Empty or whitespace-only text is rejected before chunking; the
    /// upstream extractor produced nothing usable and the caller should
    /// surface that to the uploader.
    #[inline]
    pub async fn ingest_text(&self, text: &str) -> Result<IngestReport> {
        if text.trim().is_empty() {
            return Err(KbError::Extraction(
                "No text found in document".to_string(),
            ));
        }

        let chunks = chunk_text(text, &self.chunking);
        debug!("Document produced {} chunks", chunks.len());

        let embeddings = self
            .embeddings
            .embed_batch(&chunks)
            .map_err(|e| KbError::Embedding(format!("Failed to embed document chunks: {e}")))?;

        if embeddings.len() != chunks.len() {
            return Err(KbError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let records: Vec<NewChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| NewChunk { content, embedding })
            .collect();

        let chunks_stored = records.len();
        self.store.insert_chunks(records).await?;

        info!("Ingested document as {} searchable chunks", chunks_stored);
        Ok(IngestReport { chunks_stored })
    }
}
