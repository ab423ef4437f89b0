use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::database::{ChunkStore, PgChunkStore, SENTINEL_SIMILARITY};
use crate::embeddings::{EmbeddingProvider, OpenAiClient};
use crate::ingest::Ingestor;
use crate::intent::default_catalog;
use crate::mcp::McpServer;
use crate::mcp::tools::SearchKnowledgeBaseHandler;
use crate::retriever::KnowledgeBaseRetriever;
use crate::search::SearchEngine;

/// Print the resolved configuration, optionally writing a default file
/// first.
#[inline]
pub fn show_config(init: bool) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    if init && !config.config_file_path().exists() {
        config.save().context("Failed to write default config")?;
        println!(
            "Wrote default config to {}",
            config.config_file_path().display()
        );
        println!();
    }

    println!("Config file: {}", config.config_file_path().display());
    println!();
    println!("[embeddings]");
    println!("  endpoint: {}", config.embeddings.endpoint);
    println!("  model: {}", config.embeddings.model);
    println!("  batch size: {}", config.embeddings.batch_size);
    println!("  dimension: {}", config.embeddings.dimension);
    println!("  api key env: {}", config.embeddings.api_key_env);
    println!("[database]");
    println!("  url: {}", config.database.url);
    println!("[chunking]");
    println!("  chunk size: {}", config.chunking.chunk_size);
    println!("  chunk overlap: {}", config.chunking.chunk_overlap);
    println!("[search]");
    println!("  default limit: {}", config.search.default_limit);
    println!("  default threshold: {}", config.search.default_threshold);
    println!("  lenient threshold: {}", config.search.lenient_threshold);
    println!("  relaxed threshold: {}", config.search.relaxed_threshold);
    println!("  intent confidence: {}", config.search.intent_confidence);

    Ok(())
}

/// Ingest a document's extracted text into the knowledge base
#[inline]
pub async fn ingest_document(path: &Path) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    info!("Ingesting document text from {}", path.display());

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document text from {}", path.display()))?;

    let store = connect_store(&config).await?;
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(embedding_client(&config)?);
    let ingestor = Ingestor::new(store, embeddings, config.chunking.clone());

    match ingestor.ingest_text(&text).await {
        Ok(report) => {
            println!("Created {} searchable chunks", report.chunks_stored);
            Ok(())
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            println!("Failed to ingest document: {e}");
            Err(e.into())
        }
    }
}

/// Run a hybrid search from the command line and print ranked results
#[inline]
pub async fn run_search(query: &str, limit: Option<usize>, threshold: Option<f32>) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    let limit = limit.unwrap_or(config.search.default_limit);
    let threshold = threshold.unwrap_or(config.search.default_threshold);

    let store = connect_store(&config).await?;
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(embedding_client(&config)?);
    let engine = SearchEngine::new(store, embeddings);

    let matches = engine
        .search(query, limit, threshold)
        .await
        .context("Search failed")?;

    if matches.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    println!("Found {} matches:", matches.len());
    println!();
    for item in &matches {
        if item.similarity == SENTINEL_SIMILARITY {
            println!("  [keyword match] {}", item.content);
        } else {
            println!("  [{:.3}] {}", item.similarity, item.content);
        }
    }

    Ok(())
}

/// Start the MCP server on stdio
#[inline]
pub async fn serve_mcp() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    // Fail loudly up front when the embedding provider is unreachable;
    // every retrieval path needs it.
    let client = embedding_client(&config)?;
    match client.health_check() {
        Ok(()) => {
            info!(
                "Embedding provider healthy at {} with model {}",
                config.embeddings.endpoint, config.embeddings.model
            );
        }
        Err(e) => {
            error!("Embedding provider health check failed: {}", e);
            println!("Warning: embedding provider is not healthy: {e}");
            println!("Retrieval will report structured errors until it recovers.");
        }
    }

    let store = connect_store(&config).await?;
    let retriever = Arc::new(KnowledgeBaseRetriever::new(
        store,
        Arc::new(client),
        default_catalog(),
        config.search.clone(),
    ));

    let server = Arc::new(McpServer::new(
        "kb-mcp".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    ));

    server
        .register_tool(
            SearchKnowledgeBaseHandler::tool_definition(),
            SearchKnowledgeBaseHandler::new(retriever),
        )
        .await;

    println!("MCP server initialized with tool: search_knowledge_base");
    println!("Serving on stdio transport. Press Ctrl+C to stop.");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result.context("MCP server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nReceived interrupt signal, shutting down...");
        }
    }

    println!("Shutdown complete");
    Ok(())
}

/// Show connectivity and content status for every component
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("kb-mcp status");
    println!("{}", "=".repeat(40));
    println!();

    println!("Database:");
    match connect_store(&config).await {
        Ok(store) => {
            println!("  connected: {}", config.database.url);
            match store.count_chunks().await {
                Ok(count) => println!("  stored chunks: {count}"),
                Err(e) => println!("  failed to count chunks: {e}"),
            }
        }
        Err(e) => {
            println!("  connection failed: {e}");
        }
    }

    println!();
    println!("Embedding provider:");
    match embedding_client(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!("  healthy: {}", config.embeddings.endpoint);
                println!("  model: {}", config.embeddings.model);
            }
            Err(e) => println!("  unhealthy: {e}"),
        },
        Err(e) => println!("  client error: {e}"),
    }

    println!();
    println!(
        "Intent catalog: {} intents configured",
        default_catalog().len()
    );

    Ok(())
}

async fn connect_store(config: &Config) -> Result<Arc<dyn ChunkStore>> {
    let store = PgChunkStore::connect(&config.database.url, config.embeddings.dimension)
        .await
        .context("Failed to connect to chunk store")?;
    Ok(Arc::new(store))
}

fn embedding_client(config: &Config) -> Result<OpenAiClient> {
    OpenAiClient::from_env(&config.embeddings).context("Failed to create embedding client")
}
