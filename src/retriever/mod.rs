// Retrieval orchestrator module
// The tool-callable entry point: an ordered cascade of retrieval
// strategies, first non-empty result wins.


use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::Result;
use crate::config::SearchConfig;
use crate::database::{ChunkMatch, ChunkStore};
use crate::embeddings::EmbeddingProvider;
use crate::intent::{Intent, IntentClassifier};
use crate::search::SearchEngine;

/// Structured result handed to the model-calling layer. Retrieval always
/// produces one of these; failures are reported in `error`, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalOutcome {
    pub found: bool,
    pub count: usize,
    pub items: Vec<ChunkMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetrievalOutcome {
    fn found(items: Vec<ChunkMatch>) -> Self {
        Self {
            found: true,
            count: items.len(),
            items,
            error: None,
        }
    }

    fn empty() -> Self {
        Self {
            found: false,
            count: 0,
            items: Vec::new(),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            found: false,
            count: 0,
            items: Vec::new(),
            error: Some(message),
        }
    }
}

/// The cascade, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Semantic search with a loose similarity floor.
    LenientSemantic,
    /// Intent-driven keyword search when classification is confident.
    IntentKeywords,
    /// Semantic search with no similarity floor at all.
    RelaxedSemantic,
}

const STAGES: [Strategy; 3] = [
    Strategy::LenientSemantic,
    Strategy::IntentKeywords,
    Strategy::RelaxedSemantic,
];

impl Strategy {
    /// Whether a failure in this stage may fall through to the next stage
    /// instead of ending the cascade.
    fn is_recoverable(self) -> bool {
        matches!(self, Strategy::IntentKeywords)
    }
}

/// Orchestrates the retrieval cascade behind the knowledge-base tool.
pub struct KnowledgeBaseRetriever {
    engine: SearchEngine,
    classifier: IntentClassifier,
    store: Arc<dyn ChunkStore>,
    policy: SearchConfig,
}

impl KnowledgeBaseRetriever {
    #[inline]
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        intents: Vec<Intent>,
        policy: SearchConfig,
    ) -> Self {
        let engine = SearchEngine::new(Arc::clone(&store), Arc::clone(&embeddings));
        let classifier = IntentClassifier::new(embeddings, intents);

        Self {
            engine,
            classifier,
            store,
            policy,
        }
    }

    /// Run the cascade for `query`.
    ///
    /// Stages run strictly in order and the first non-empty result set is
    /// returned. A failure in the intent stage is logged and the cascade
    /// continues; a failure in a semantic stage ends the cascade with a
    /// structured error outcome. This method never returns `Err`.
    #[inline]
    pub async fn retrieve(&self, query: &str) -> RetrievalOutcome {
        debug!("Knowledge base retrieval for query: {query}");

        for strategy in STAGES {
            match self.run_stage(strategy, query).await {
                Ok(items) if !items.is_empty() => {
                    debug!("{:?} produced {} matches", strategy, items.len());
                    return RetrievalOutcome::found(items);
                }
                Ok(_) => {
                    debug!("{:?} produced no matches", strategy);
                }
                Err(e) if strategy.is_recoverable() => {
                    warn!("{:?} failed, continuing cascade: {}", strategy, e);
                }
                Err(e) => {
                    error!("{:?} failed, ending cascade: {}", strategy, e);
                    return RetrievalOutcome::failed(e.to_string());
                }
            }
        }

        RetrievalOutcome::empty()
    }

    async fn run_stage(&self, strategy: Strategy, query: &str) -> Result<Vec<ChunkMatch>> {
        match strategy {
            Strategy::LenientSemantic => {
                self.engine
                    .search(query, self.policy.semantic_limit, self.policy.lenient_threshold)
                    .await
            }
            Strategy::IntentKeywords => self.intent_keyword_search(query).await,
            Strategy::RelaxedSemantic => {
                self.engine
                    .search(query, self.policy.semantic_limit, self.policy.relaxed_threshold)
                    .await
            }
        }
    }

    async fn intent_keyword_search(&self, query: &str) -> Result<Vec<ChunkMatch>> {
        let (best, score) = self.classifier.classify(query)?;

        let Some(intent) = best else {
            return Ok(Vec::new());
        };

        debug!("Detected intent {} with score {}", intent.id, score);

        if score <= self.policy.intent_confidence {
            debug!(
                "Score below confidence threshold {}, skipping keyword search",
                self.policy.intent_confidence
            );
            return Ok(Vec::new());
        }

        let keywords: Vec<String> = intent
            .keywords
            .iter()
            .take(self.policy.max_intent_keywords)
            .cloned()
            .collect();

        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .query_by_substring(&keywords, self.policy.intent_match_limit)
            .await
    }
}
