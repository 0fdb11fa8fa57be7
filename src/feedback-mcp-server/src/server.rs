//! MCP server core: request dispatch and the stdio transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use feedback_mcp_types::{
    CallToolParams, CallToolResult, CancelledNotification, Implementation, IncomingMessage,
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, LogLevel, ServerCapabilities, SetLogLevelParams,
    Tool, methods,
};

use crate::handlers::ToolHandler;

// ============================================================================
// MCP Server
// ============================================================================

/// MCP server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for `initialize`.
    Uninitialized,
    /// `initialize` answered, waiting for `notifications/initialized`.
    Initializing,
    /// Ready to handle requests.
    Ready,
    /// Stop requested.
    ShuttingDown,
    /// Transport closed.
    Stopped,
}

/// Callback run when the transport loop exits.
pub(crate) type ShutdownHook = Arc<dyn Fn() + Send + Sync>;

/// MCP server hosting a fixed set of tools.
pub struct McpServer {
    info: Implementation,
    capabilities: ServerCapabilities,
    tools: HashMap<String, Arc<dyn ToolHandler>>,
    log_level: RwLock<LogLevel>,
    state: RwLock<ServerState>,
    running: AtomicBool,
    client_info: RwLock<Option<Implementation>>,
    pub(crate) instructions: Option<String>,
    pub(crate) shutdown_hooks: Vec<ShutdownHook>,
}

impl McpServer {
    /// Create a new MCP server with its tools.
    pub fn new(
        info: Implementation,
        capabilities: ServerCapabilities,
        tools: HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Self {
        Self {
            info,
            capabilities,
            tools,
            log_level: RwLock::new(LogLevel::Info),
            state: RwLock::new(ServerState::Uninitialized),
            running: AtomicBool::new(false),
            client_info: RwLock::new(None),
            instructions: None,
            shutdown_hooks: Vec::new(),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &Implementation {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Get current state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Check if the transport loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get all registered tools, sorted by name.
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.values().map(|h| h.tool()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get the client that completed `initialize`, if any.
    pub async fn client_info(&self) -> Option<Implementation> {
        self.client_info.read().await.clone()
    }

    /// Get current log level.
    pub async fn log_level(&self) -> LogLevel {
        *self.log_level.read().await
    }

    // ========================================================================
    // Request Handlers
    // ========================================================================

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = %request.id, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params).await,
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(),
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            methods::LOGGING_SET_LEVEL => self.handle_set_log_level(request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    /// Handle a JSON-RPC notification.
    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        debug!(method = %notification.method, "Handling notification");

        match notification.method.as_str() {
            methods::INITIALIZED => {
                *self.state.write().await = ServerState::Ready;
                info!("Server initialized and ready");
            }
            methods::CANCELLED => {
                // Sessions end only on submit, cancel in the surface, or timeout.
                let cancelled = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledNotification>(p).ok());
                if let Some(cancelled) = cancelled {
                    info!(
                        request_id = %cancelled.request_id,
                        reason = cancelled.reason.as_deref().unwrap_or(""),
                        "Ignoring client cancellation; session keeps waiting for the user"
                    );
                }
            }
            _ => {
                debug!(method = %notification.method, "Ignoring notification");
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        // Check-and-set under one write lock so concurrent initialize calls cannot both pass.
        {
            let mut state_guard = self.state.write().await;
            if *state_guard != ServerState::Uninitialized {
                return Err(JsonRpcError::invalid_request("Server already initialized"));
            }
            *state_guard = ServerState::Initializing;
        }

        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?
            .unwrap_or_default();

        info!(
            client = %init_params.client_info.name,
            version = %init_params.client_info.version,
            protocol = %init_params.protocol_version,
            "Client connected"
        );
        *self.client_info.write().await = Some(init_params.client_info);

        let mut result = InitializeResult::new(self.info.clone(), self.capabilities.clone());
        if let Some(instructions) = &self.instructions {
            result = result.with_instructions(instructions.clone());
        }

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult::new(self.tools());
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let call_params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
            })?;

        let handler = self.tools.get(&call_params.name).cloned().ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown tool: {}", call_params.name))
        })?;

        debug!(tool = %call_params.name, "Calling tool");
        let arguments = call_params.arguments.unwrap_or_else(|| json!({}));
        let call_result = match handler.execute(arguments).await {
            Ok(call_result) => call_result,
            Err(e) => {
                warn!(tool = %call_params.name, error = %e, "Tool call failed");
                CallToolResult::error(format!("{e:#}"))
            }
        };

        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_set_log_level(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let level_params: SetLogLevelParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
            })?;

        *self.log_level.write().await = level_params.level;
        debug!(level = %level_params.level, "Log level changed");

        Ok(json!({}))
    }

    // ========================================================================
    // Transport: Stdio
    // ========================================================================

    /// Run the server over the process's stdin/stdout.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.info.name, "Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`.
    ///
    /// Requests run concurrently; responses are written by a single task in
    /// completion order. Returns when `reader` reaches EOF or [`stop`] is called.
    ///
    /// [`stop`]: McpServer::stop
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = JoinSet::new();

        while self.running.load(Ordering::SeqCst) {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Error reading from transport");
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match IncomingMessage::parse(trimmed) {
                Ok(IncomingMessage::Request(request)) => {
                    let server = Arc::clone(&self);
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        let response = server.handle_request(request).await;
                        let _ = tx.send(response);
                    });
                }
                Ok(IncomingMessage::Notification(notification)) => {
                    self.handle_notification(notification).await;
                }
                Err(e) => {
                    warn!(line = %trimmed, error = %e, "Invalid JSON-RPC message");
                    let _ = tx.send(JsonRpcResponse::error_without_id(JsonRpcError::parse_error(
                        format!("Invalid JSON-RPC message: {e}"),
                    )));
                }
            }

            // Reap finished requests so the set does not grow without bound.
            while in_flight.try_join_next().is_some() {}
        }

        // The client is gone; nobody is left to read pending answers.
        // Aborting only drops the futures, so blocking work is released by the hooks.
        in_flight.abort_all();
        for hook in &self.shutdown_hooks {
            hook();
        }
        drop(tx);
        let write_result = writer_task.await.context("Response writer panicked")?;

        *self.state.write().await = ServerState::Stopped;
        self.running.store(false, Ordering::SeqCst);
        info!("MCP server stopped");

        write_result
    }

    /// Request the transport loop to stop after the current message.
    pub async fn stop(&self) {
        info!("Stopping MCP server");
        *self.state.write().await = ServerState::ShuttingDown;
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_json =
            serde_json::to_string(&response).context("Failed to serialize response")?;
        writer
            .write_all(response_json.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
