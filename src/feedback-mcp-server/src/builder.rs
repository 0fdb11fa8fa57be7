//! Builder for [`McpServer`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use feedback_mcp_types::{CallToolResult, Implementation, ServerCapabilities, Tool};
use serde_json::Value;

use crate::handlers::{FnToolHandler, ToolHandler};
use crate::server::{McpServer, ShutdownHook};

/// Builder for creating MCP servers.
pub struct McpServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn ToolHandler>>,
    instructions: Option<String>,
    shutdown_hooks: Vec<ShutdownHook>,
}

impl McpServerBuilder {
    /// Create a new server builder.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            instructions: None,
            shutdown_hooks: Vec::new(),
        }
    }

    /// Enable logging capability.
    pub fn with_logging_capability(mut self) -> Self {
        self.capabilities = self.capabilities.with_logging();
        self
    }

    /// Add a tool handler.
    pub fn tool_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(handler);
        self.capabilities = self.capabilities.with_tools();
        self
    }

    /// Add a tool with a synchronous handler function.
    pub fn tool_fn<F>(self, tool: Tool, handler: F) -> Self
    where
        F: Fn(Value) -> Result<CallToolResult> + Send + Sync + 'static,
    {
        self.tool_handler(Arc::new(FnToolHandler::new(tool, handler)))
    }

    /// Set instructions for clients.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Run `hook` once the transport closes, after pending requests are dropped.
    pub fn on_shutdown(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.shutdown_hooks.push(Arc::new(hook));
        self
    }

    /// Build the server. Tools are registered before this returns.
    pub fn build(self) -> Result<Arc<McpServer>> {
        let mut tools: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for handler in self.tools {
            let name = handler.tool().name;
            if tools.insert(name.clone(), handler).is_some() {
                bail!("Tool '{name}' registered twice");
            }
        }

        let mut server = McpServer::new(
            Implementation::new(&self.name, &self.version),
            self.capabilities,
            tools,
        );
        server.instructions = self.instructions;
        server.shutdown_hooks = self.shutdown_hooks;
        Ok(Arc::new(server))
    }
}
