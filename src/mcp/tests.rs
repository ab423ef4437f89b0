//! Unit tests for the MCP server: tool definitions, the initialize
//! handshake, and tool dispatch.

mod tool_definition_tests {
    use crate::mcp::tools::SearchKnowledgeBaseHandler;

    #[test]
    fn search_knowledge_base_tool_definition() {
        let tool = SearchKnowledgeBaseHandler::tool_definition();

        assert_eq!(tool.name, "search_knowledge_base");
        assert_eq!(
            tool.description,
            Some("Search the knowledge base for relevant information".to_string())
        );

        let schema = tool.input_schema;
        let properties = schema["properties"].as_object().expect("has properties");
        assert!(properties.contains_key("query"));
        assert_eq!(schema["properties"]["query"]["type"], "string");

        let required = schema["required"].as_array().expect("has required array");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "query");
    }
}

mod server_tests {
    use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
    use crate::mcp::server::{ConnectionState, McpServer, ToolHandler};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
            let args = params.arguments.unwrap_or_default();
            let input = args
                .get("input")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(CallToolResult {
                content: vec![ToolContent::Text {
                    text: format!("echo: {input}"),
                }],
                is_error: Some(false),
            })
        }
    }

    fn echo_tool() -> Tool {
        Tool {
            name: "echo".to_string(),
            description: None,
            input_schema: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_info_and_capabilities() {
        let server = McpServer::new("kb-mcp".to_string(), "0.0.1".to_string());

        let params = json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0"}
        });

        let result = server
            .handle_initialize(Some(params))
            .await
            .expect("initialize should succeed");

        assert_eq!(result["serverInfo"]["name"], "kb-mcp");
        assert_eq!(result["protocolVersion"], "2025-06-18");
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(server.connection_state().await, ConnectionState::Initializing);
    }

    #[tokio::test]
    async fn initialize_without_params_is_rejected() {
        let server = McpServer::new("kb-mcp".to_string(), "0.0.1".to_string());

        assert!(server.handle_initialize(None).await.is_err());
    }

    #[tokio::test]
    async fn registered_tools_are_listed() {
        let server = McpServer::new("kb-mcp".to_string(), "0.0.1".to_string());
        server.register_tool(echo_tool(), EchoHandler).await;

        let result = server.handle_list_tools().await.expect("list tools");

        let tools = result["tools"].as_array().expect("tools array");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
    }

    #[tokio::test]
    async fn tool_calls_dispatch_to_the_handler() {
        let server = McpServer::new("kb-mcp".to_string(), "0.0.1".to_string());
        server.register_tool(echo_tool(), EchoHandler).await;

        let params = json!({
            "name": "echo",
            "arguments": {"input": "hello"}
        });

        let result = server
            .handle_call_tool(Some(params))
            .await
            .expect("tool call should succeed");

        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "echo: hello");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn unknown_tool_call_is_an_error() {
        let server = McpServer::new("kb-mcp".to_string(), "0.0.1".to_string());

        let params = json!({"name": "missing", "arguments": {}});

        assert!(server.handle_call_tool(Some(params)).await.is_err());
    }
}
