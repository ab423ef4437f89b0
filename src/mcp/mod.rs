//! MCP (Model Context Protocol) server for the knowledge-base tool.
//!
//! Implements the JSON-RPC 2.0 subset this server needs over stdio:
//! initialization, tool listing, and tool calls.

#[cfg(test)]
mod tests;

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{McpServer, ToolHandler};
