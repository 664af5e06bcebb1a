//! MCP server implementation for leave-record queries.
//!
//! [`McpServer`] owns the record set and the session store and turns one
//! incoming JSON-RPC message into at most one outgoing message. It holds no
//! transport of its own; the HTTP handlers and the stdio loop below both feed
//! it.
//!
//! Lifecycle per session:
//!
//! 1. **Uninitialised**: session exists, `initialize` not yet seen
//! 2. **Initialised**: `initialize` received (sending it again is harmless)
//!
//! No method is gated on initialisation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dataset::RecordSet;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, InitializeParams, JsonRpcError, JsonRpcResponse, McpMethod,
    OutgoingMessage, RequestId, ToolCallParams, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::session::{new_session_id, SessionStore};
use crate::mcp::transport::StdioTransport;
use crate::query::classify_and_aggregate;

/// Name of the only tool this server exposes.
pub const SNOWFLAKE_QUERY_TOOL: &str = "snowflake_query";

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities { list_changed: true }),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Arguments accepted by `snowflake_query`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnowflakeQueryArgs {
    /// Free-text query; absent, null and empty all yield the default summary.
    pub query: Option<String>,
}

impl SnowflakeQueryArgs {
    /// The query text, empty when none was given.
    #[must_use]
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Creates a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }
}

/// The MCP server for leave-record queries.
#[derive(Debug)]
pub struct McpServer {
    /// Dataset shared by every session.
    records: Arc<RecordSet>,
    /// Per-session protocol state.
    sessions: SessionStore,
}

impl McpServer {
    /// Creates a server over `records` using `sessions` for protocol state.
    #[must_use]
    pub const fn new(records: Arc<RecordSet>, sessions: SessionStore) -> Self {
        Self { records, sessions }
    }

    /// Returns the record set.
    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Returns the session store.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Opens a new session and returns its identifier.
    #[must_use]
    pub fn open_session(&self) -> String {
        self.sessions.open()
    }

    /// Handles one raw JSON message for `session_id`.
    ///
    /// A missing session ID gets a fresh one for this call only.
    #[must_use]
    pub fn handle_raw(&self, session_id: Option<&str>, raw: &str) -> OutgoingMessage {
        match parse_message(raw) {
            Ok(msg) => self.handle_message(session_id, &msg),
            Err(error) => {
                tracing::debug!(code = error.error.code, "Rejected malformed message");
                error.into()
            }
        }
    }

    /// Handles one parsed message for `session_id`.
    ///
    /// Without a session identifier the call runs under a throwaway session
    /// that is dropped before returning.
    #[must_use]
    pub fn handle_message(
        &self,
        session_id: Option<&str>,
        msg: &IncomingMessage,
    ) -> OutgoingMessage {
        let (session_id, anonymous) = match session_id {
            Some(session_id) => (session_id.to_string(), false),
            None => (new_session_id(), true),
        };
        if !anonymous {
            self.sessions.touch(&session_id);
        }

        let id = msg.id().cloned();
        tracing::debug!(session_id = %session_id, method = msg.method(), "Handling message");

        let method = match McpMethod::decode(msg) {
            Ok(method) => method,
            Err(error) => return error.into(),
        };

        let response = match method {
            McpMethod::Initialize(params) => Ok(self.handle_initialize(&session_id, id, &params)),
            McpMethod::Initialized => Ok(JsonRpcResponse::success(id, json!("ok"))),
            McpMethod::ToolsList => Ok(self.handle_tools_list(&session_id, id)),
            McpMethod::ToolsCall(params) => self.handle_tools_call(id, &params),
            McpMethod::Ping => Ok(JsonRpcResponse::success(id, json!({}))),
            McpMethod::Unknown(name) => {
                tracing::debug!(method = %name, "Unknown method");
                Err(JsonRpcError::method_not_found(id, &name))
            }
        };

        if anonymous {
            self.sessions.remove(&session_id);
        }

        match response {
            Ok(resp) => resp.into(),
            Err(error) => error.into(),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(
        &self,
        session_id: &str,
        id: Option<RequestId>,
        params: &InitializeParams,
    ) -> JsonRpcResponse {
        if let Some(client) = &params.client_info {
            tracing::info!(
                session_id,
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "Client initialising"
            );
        }

        self.sessions.mark_initialized(session_id);

        JsonRpcResponse::success(id, Self::initialize_result())
    }

    /// The capability descriptor returned by `initialize`.
    #[must_use]
    pub fn initialize_result() -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        })
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, session_id: &str, id: Option<RequestId>) -> JsonRpcResponse {
        let tools = Self::get_tool_definitions();
        self.sessions
            .register_tools(session_id, tools.iter().map(|t| t.name.as_str()));

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Handles the tools/call request.
    fn handle_tools_call(
        &self,
        id: Option<RequestId>,
        params: &ToolCallParams,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        if params.name != SNOWFLAKE_QUERY_TOOL {
            tracing::debug!(tool = %params.name, "Unknown tool");
            return Err(JsonRpcError::unknown_tool(id, &params.name));
        }

        let args: SnowflakeQueryArgs = match &params.arguments {
            Value::Null => SnowflakeQueryArgs::default(),
            value => SnowflakeQueryArgs::deserialize(value).map_err(|e| {
                JsonRpcError::invalid_params(
                    id.clone(),
                    format!("Invalid {SNOWFLAKE_QUERY_TOOL} arguments: {e}"),
                )
            })?,
        };

        let result = self.call_snowflake_query(&args);

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(id.clone(), "Internal error: failed to serialise result")
        })?;

        Ok(JsonRpcResponse::success(id, result_value))
    }

    /// Runs a query against the record set and renders the table as text.
    fn call_snowflake_query(&self, args: &SnowflakeQueryArgs) -> ToolCallResult {
        let table = classify_and_aggregate(args.query(), &self.records);
        tracing::info!(
            query = args.query(),
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Executed query"
        );
        ToolCallResult::text(table.to_text_table())
    }

    /// Returns the list of available tools.
    #[must_use]
    pub fn get_tool_definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: SNOWFLAKE_QUERY_TOOL.to_string(),
            description: Some("Execute SQL queries on leave data".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL query to execute"
                    }
                },
                "required": ["query"]
            }),
        }]
    }

    /// Serves MCP over stdio until EOF or a shutdown signal.
    ///
    /// All messages share one session. Notifications get no reply on this
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve_stdio(&self, mut transport: StdioTransport) -> std::io::Result<()> {
        let session_id = self.open_session();
        tracing::info!(session_id = %session_id, "Serving MCP over stdio");
        self.run_with_shutdown(&mut transport, &session_id).await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(
        &self,
        transport: &mut StdioTransport,
        session_id: &str,
    ) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, session_id, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(
        &self,
        transport: &mut StdioTransport,
        session_id: &str,
    ) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, session_id, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &self,
        transport: &mut StdioTransport,
        session_id: &str,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("stdin closed, shutting down");
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        match parse_message(&line) {
            Ok(msg) => {
                let reply = self.handle_message(Some(session_id), &msg);
                if msg.id().is_some() {
                    transport.write_message(&reply).await?;
                }
            }
            Err(error) => transport.write_message(&error.into()).await?,
        }

        Ok(false)
    }
}
