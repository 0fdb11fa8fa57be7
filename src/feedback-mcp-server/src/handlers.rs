//! Tool handler trait and the function-backed implementation.

use anyhow::Result;
use feedback_mcp_types::{CallToolResult, Tool};
use serde_json::Value;

/// A tool the server can list and invoke.
///
/// Returning `Err` is not a protocol failure: the server reports it to the
/// client as a `CallToolResult` with `isError` set and the error's message
/// as text.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn tool(&self) -> Tool;

    /// Execute the tool with given arguments.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

/// A tool backed by a synchronous closure.
pub struct FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    tool: Tool,
    handler: F,
}

impl<F> FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    /// Create a new function-based tool handler.
    pub fn new(tool: Tool, handler: F) -> Self {
        Self { tool, handler }
    }
}

#[async_trait::async_trait]
impl<F> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    fn tool(&self) -> Tool {
        self.tool.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        (self.handler)(arguments)
    }
}
