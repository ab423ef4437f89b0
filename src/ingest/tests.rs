use super::*;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::database::ChunkMatch;

#[derive(Default)]
struct RecordingStore {
    inserted: Mutex<Vec<Vec<NewChunk>>>,
    insert_fails: bool,
}

#[async_trait]
impl ChunkStore for RecordingStore {
    async fn insert_chunks(&self, chunks: Vec<NewChunk>) -> crate::Result<()> {
        if self.insert_fails {
            return Err(crate::KbError::Database("connection lost".to_string()));
        }
        self.inserted.lock().expect("lock").push(chunks);
        Ok(())
    }

    async fn query_by_similarity(
        &self,
        _embedding: &[f32],
        _threshold: f32,
        _limit: usize,
    ) -> crate::Result<Vec<ChunkMatch>> {
        Ok(Vec::new())
    }

    async fn query_by_substring(
        &self,
        _terms: &[String],
        _limit: usize,
    ) -> crate::Result<Vec<ChunkMatch>> {
        Ok(Vec::new())
    }

    async fn count_chunks(&self) -> crate::Result<u64> {
        Ok(0)
    }
}

/// Maps each text to a vector derived from its length, so pairings are
/// checkable.
struct LengthEmbedder {
    fails: bool,
}

impl EmbeddingProvider for LengthEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.fails {
            anyhow::bail!("provider unavailable");
        }
        Ok(vec![text.len() as f32, 1.0])
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

fn ingestor(store: Arc<RecordingStore>, fails: bool) -> Ingestor {
    Ingestor::new(
        store as Arc<dyn ChunkStore>,
        Arc::new(LengthEmbedder { fails }),
        ChunkingConfig::default(),
    )
}

#[tokio::test]
async fn empty_text_is_rejected_before_chunking() {
    let store = Arc::new(RecordingStore::default());
    let ingestor = ingestor(Arc::clone(&store), false);

    for text in ["", "   ", "\n\t\n"] {
        let result = ingestor.ingest_text(text).await;
        assert!(matches!(result, Err(KbError::Extraction(_))));
    }

    assert!(store.inserted.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn chunks_are_stored_with_their_embeddings() {
    let store = Arc::new(RecordingStore::default());
    let ingestor = ingestor(Arc::clone(&store), false);

    let text = (0..80)
        .map(|i| format!("token{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    let report = ingestor.ingest_text(&text).await.expect("ingest");

    let inserted = store.inserted.lock().expect("lock");
    assert_eq!(inserted.len(), 1, "one atomic batch");

    let batch = &inserted[0];
    assert_eq!(report.chunks_stored, batch.len());
    assert!(batch.len() > 1);

    // Each chunk carries the embedding computed from its own content.
    for chunk in batch {
        assert_eq!(chunk.embedding[0], chunk.content.len() as f32);
    }
}

#[tokio::test]
async fn short_document_is_one_chunk() {
    let store = Arc::new(RecordingStore::default());
    let ingestor = ingestor(Arc::clone(&store), false);

    let report = ingestor.ingest_text("a tiny document").await.expect("ingest");

    assert_eq!(report.chunks_stored, 1);
    let inserted = store.inserted.lock().expect("lock");
    assert_eq!(inserted[0][0].content, "a tiny document");
}

#[tokio::test]
async fn provider_failure_aborts_with_no_writes() {
    let store = Arc::new(RecordingStore::default());
    let ingestor = ingestor(Arc::clone(&store), true);

    let result = ingestor.ingest_text("some document text").await;

    assert!(matches!(result, Err(KbError::Embedding(_))));
    assert!(store.inserted.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn storage_failure_propagates() {
    let store = Arc::new(RecordingStore {
        insert_fails: true,
        ..RecordingStore::default()
    });
    let ingestor = ingestor(store, false);

    let result = ingestor.ingest_text("some document text").await;

    assert!(matches!(result, Err(KbError::Database(_))));
}
