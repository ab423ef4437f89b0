//! MCP tool implementations.
//!
//! A single tool is exposed: `search_knowledge_base`, wrapping the
//! retrieval cascade. The tool always returns the orchestrator's
//! structured outcome; retrieval failures travel inside it rather than as
//! protocol errors, because the consuming model loop expects a result
//! object either way.

use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
use crate::mcp::server::ToolHandler;
use crate::retriever::KnowledgeBaseRetriever;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Knowledge base search tool handler
pub struct SearchKnowledgeBaseHandler {
    retriever: Arc<KnowledgeBaseRetriever>,
}

impl SearchKnowledgeBaseHandler {
    #[inline]
    pub fn new(retriever: Arc<KnowledgeBaseRetriever>) -> Self {
        Self { retriever }
    }

    /// Create the search_knowledge_base tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "search_knowledge_base".to_string(),
            description: Some(
                "Search the knowledge base for relevant information".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find relevant documents"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for SearchKnowledgeBaseHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing required parameter: query"))?;

        debug!("search_knowledge_base called with query: {}", query);

        let outcome = self.retriever.retrieve(query).await;

        debug!(
            "search_knowledge_base found={} count={}",
            outcome.found, outcome.count
        );

        Ok(CallToolResult {
            content: vec![ToolContent::Text {
                text: serde_json::to_string_pretty(&outcome)?,
            }],
            is_error: Some(false),
        })
    }
}
