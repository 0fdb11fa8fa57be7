//! Feedback MCP Server - Model Context Protocol server over stdio.
//!
//! Hosts a fixed set of tools behind a newline-delimited JSON-RPC transport.
//! Tool calls run concurrently, so a long blocking call does not hold up
//! `ping` or other tools.
//!
//! # Example
//! ```rust,no_run
//! use feedback_mcp_server::McpServerBuilder;
//! use feedback_mcp_types::{CallToolResult, Tool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServerBuilder::new("my-server", "1.0.0")
//!         .tool_fn(Tool::new("hello", "Say hello"), |_| Ok(CallToolResult::text("hi")))
//!         .build()?;
//!
//!     server.run_stdio().await
//! }
//! ```

mod builder;
mod handlers;
mod server;

pub use builder::McpServerBuilder;
pub use handlers::{FnToolHandler, ToolHandler};
pub use server::{McpServer, ServerState};

pub use feedback_mcp_types;
