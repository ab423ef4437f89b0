#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use pgvector::Vector;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ChunkMatch, ChunkStore, NewChunk};
use crate::{KbError, Result};

const MAX_CONNECTIONS: u32 = 5;

/// Chunk store backed by PostgreSQL with the pgvector extension.
pub struct PgChunkStore {
    pool: PgPool,
}

/// Composes a case-insensitive OR-of-contains predicate from a list of
/// terms. Keeping the construction in one place pins down operator
/// precedence and keeps placeholder numbering and bind values in sync.
#[derive(Debug)]
pub(crate) struct SubstringFilter {
    patterns: Vec<String>,
}

impl SubstringFilter {
    pub(crate) fn new(terms: &[String]) -> Self {
        Self {
            patterns: terms.iter().map(|t| format!("%{t}%")).collect(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// SQL for the combined predicate, using placeholders starting at
    /// `$first_placeholder`.
    pub(crate) fn where_clause(&self, first_placeholder: usize) -> String {
        (0..self.patterns.len())
            .map(|i| format!("content ILIKE ${}", first_placeholder + i))
            .join(" OR ")
    }

    pub(crate) fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl PgChunkStore {
    /// Connect to the database and ensure the schema exists.
    #[inline]
    pub async fn connect(database_url: &str, embedding_dimension: u32) -> Result<Self> {
        debug!("Connecting to Postgres chunk store");

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| KbError::Database(format!("Failed to connect to Postgres: {e}")))?;

        let store = Self { pool };
        store.ensure_schema(embedding_dimension).await?;

        info!("Chunk store initialized");
        Ok(store)
    }

    async fn ensure_schema(&self, embedding_dimension: u32) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| KbError::Database(format!("Failed to ensure vector extension: {e}")))?;

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS document_chunks (
                id UUID PRIMARY KEY,
                content TEXT NOT NULL,
                embedding VECTOR({embedding_dimension}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| KbError::Database(format!("Failed to create chunks table: {e}")))?;

        Ok(())
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn parse_match(row: &PgRow) -> Result<ChunkMatch> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| KbError::Database(format!("Invalid id column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| KbError::Database(format!("Invalid content column: {e}")))?;
        let similarity: f64 = row
            .try_get("similarity")
            .map_err(|e| KbError::Database(format!("Invalid similarity column: {e}")))?;

        Ok(ChunkMatch {
            id,
            content,
            similarity: similarity as f32,
        })
    }
}

#[async_trait]
impl ChunkStore for PgChunkStore {
    #[inline]
    async fn insert_chunks(&self, chunks: Vec<NewChunk>) -> Result<()> {
        if chunks.is_empty() {
            debug!("No chunks to store");
            return Ok(());
        }

        debug!("Storing batch of {} chunks", chunks.len());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| KbError::Database(format!("Failed to begin transaction: {e}")))?;

        let now = Utc::now();
        for chunk in chunks {
            sqlx::query(
                "INSERT INTO document_chunks (id, content, embedding, created_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(&chunk.content)
            .bind(Vector::from(chunk.embedding))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| KbError::Database(format!("Failed to insert chunk: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| KbError::Database(format!("Failed to commit chunk batch: {e}")))?;

        info!("Stored chunk batch");
        Ok(())
    }

    #[inline]
    async fn query_by_similarity(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        debug!(
            "Similarity query with threshold {} and limit {}",
            threshold, limit
        );

        let rows = sqlx::query(
            "SELECT id, content, 1 - (embedding <=> $1) AS similarity
             FROM document_chunks
             WHERE 1 - (embedding <=> $1) > $2
             ORDER BY similarity DESC
             LIMIT $3",
        )
        .bind(Vector::from(embedding.to_vec()))
        .bind(f64::from(threshold))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KbError::Database(format!("Failed to execute similarity query: {e}")))?;

        let matches = rows
            .iter()
            .map(Self::parse_match)
            .collect::<Result<Vec<_>>>()?;

        debug!("Similarity query returned {} rows", matches.len());
        Ok(matches)
    }

    #[inline]
    async fn query_by_substring(&self, terms: &[String], limit: usize) -> Result<Vec<ChunkMatch>> {
        let filter = SubstringFilter::new(terms);
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Substring query over {} terms with limit {}",
            terms.len(),
            limit
        );

        let sql = format!(
            "SELECT id, content, 1.0::float8 AS similarity
             FROM document_chunks
             WHERE {}
             LIMIT ${}",
            filter.where_clause(1),
            filter.patterns().len() + 1
        );

        let mut query = sqlx::query(&sql);
        for pattern in filter.patterns() {
            query = query.bind(pattern);
        }
        query = query.bind(limit as i64);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| KbError::Database(format!("Failed to execute substring query: {e}")))?;

        let matches = rows
            .iter()
            .map(Self::parse_match)
            .collect::<Result<Vec<_>>>()?;

        debug!("Substring query returned {} rows", matches.len());
        Ok(matches)
    }

    #[inline]
    async fn count_chunks(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM document_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KbError::Database(format!("Failed to count chunks: {e}")))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| KbError::Database(format!("Invalid count column: {e}")))?;

        Ok(count.unsigned_abs())
    }
}
