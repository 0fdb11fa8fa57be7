//! Model Context Protocol type definitions used by the feedback collector.
//!
//! Only the slice of MCP the collector speaks is modelled here:
//! - JSON-RPC 2.0 envelopes and error codes
//! - `initialize` handshake and capability negotiation
//! - tool definitions, tool calls and their text/image results
//! - `logging/setLevel`
//!
//! # Example
//! ```rust
//! use feedback_mcp_types::{PropertySchema, Tool, ToolInputSchema};
//!
//! let tool = Tool::new("get_image_info", "Describe an image file")
//!     .with_schema(ToolInputSchema::object()
//!         .property("image_path", PropertySchema::string().description("Image file path"))
//!         .required(vec!["image_path"]));
//! assert_eq!(tool.name, "get_image_info");
//! ```

// ============================================================================
// Module declarations
// ============================================================================

mod capabilities;
mod content;
mod initialization;
mod jsonrpc;
mod logging;
mod notifications;
mod tools;

/// MCP method name constants.
pub mod methods;

// ============================================================================
// Protocol Version
// ============================================================================

/// MCP protocol version spoken by the server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Re-exports
// ============================================================================

// JSON-RPC types
pub use jsonrpc::{
    ErrorCode, IncomingMessage, JSONRPC_VERSION, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId,
};

// Initialization types
pub use initialization::{Implementation, InitializeParams, InitializeResult};

// Capability types
pub use capabilities::{
    ClientCapabilities, LoggingCapability, ServerCapabilities, ToolsCapability,
};

// Tool types
pub use tools::{
    CallToolParams, CallToolResult, ListToolsResult, PropertySchema, Tool, ToolInputSchema,
};

// Content types
pub use content::Content;

// Logging types
pub use logging::{LogLevel, SetLogLevelParams};

// Notification types
pub use notifications::CancelledNotification;
