//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the core message types used in the Model Context Protocol.
//! All messages follow the JSON-RPC 2.0 specification with MCP-specific extensions.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `id`)
//! - **Response**: A reply to a request (success or error)
//! - **Notification**: A one-way message (no `id`)
//!
//! Incoming messages are further decoded into [`McpMethod`], one variant per
//! supported method, so handlers never look at untyped parameters.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "leave-query-mcp";

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
///
/// Requests expect a response from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Validates that this is a well-formed JSON-RPC 2.0 request.
    ///
    /// Returns an error message if validation fails.
    #[must_use]
    pub fn validate(&self) -> Option<&'static str> {
        if self.jsonrpc != "2.0" {
            return Some("jsonrpc field must be \"2.0\"");
        }
        if self.method.is_empty() {
            return Some("method field cannot be empty");
        }
        None
    }
}

/// A JSON-RPC 2.0 notification message (incoming).
///
/// Notifications carry no ID.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to (absent for notifications).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method (or tool) does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>) -> Self {
        Self::new(id, JsonRpcErrorData::from_code(ErrorCode::InvalidRequest))
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an unknown tool error response.
    ///
    /// Shares the method-not-found code.
    #[must_use]
    pub fn unknown_tool(id: Option<RequestId>, tool: &str) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Unknown tool: {tool}"),
            ),
        )
    }

    /// Creates an invalid params error response.
    #[must_use]
    pub fn invalid_params(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// A message going back to the client: exactly one of result or error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// Successful result.
    Response(JsonRpcResponse),
    /// Error.
    Error(JsonRpcError),
}

impl OutgoingMessage {
    /// Returns the ID the message answers, if any.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Option::as_ref is not const
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(resp) => resp.id.as_ref(),
            Self::Error(err) => err.id.as_ref(),
        }
    }

    /// Returns the error payload if this is an error.
    #[must_use]
    pub const fn error(&self) -> Option<&JsonRpcErrorData> {
        match self {
            Self::Response(_) => None,
            Self::Error(err) => Some(&err.error),
        }
    }

    /// Returns the result payload if this is a success.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Response(resp) => Some(&resp.result),
            Self::Error(_) => None,
        }
    }
}

impl From<JsonRpcResponse> for OutgoingMessage {
    fn from(value: JsonRpcResponse) -> Self {
        Self::Response(value)
    }
}

impl From<JsonRpcError> for OutgoingMessage {
    fn from(value: JsonRpcError) -> Self {
        Self::Error(value)
    }
}

/// An incoming message that could be either a request or notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification.
    Notification(JsonRpcNotification),
}

impl IncomingMessage {
    /// Returns the method name of this message.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(notif) => &notif.method,
        }
    }

    /// Returns the parameters of this message.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Option::as_ref is not const
    pub fn params(&self) -> Option<&Value> {
        match self {
            Self::Request(req) => req.params.as_ref(),
            Self::Notification(notif) => notif.params.as_ref(),
        }
    }

    /// Returns the request ID if this is a request.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Notification(_) => None,
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
///
/// A missing name decodes as empty and is then reported as an unknown tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    #[serde(default, deserialize_with = "lenient_tool_name")]
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// A decoded MCP method.
#[derive(Debug, Clone)]
pub enum McpMethod {
    /// `initialize`
    Initialize(InitializeParams),
    /// `notifications/initialized`
    Initialized,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall(ToolCallParams),
    /// `ping`
    Ping,
    /// Anything else; carries the method name.
    Unknown(String),
}

impl McpMethod {
    /// Decodes a message's method name and parameters.
    ///
    /// # Errors
    ///
    /// Returns an invalid params error if the parameters of a known method
    /// do not have the expected shape.
    pub fn decode(msg: &IncomingMessage) -> Result<Self, JsonRpcError> {
        let id = msg.id().cloned();
        match msg.method() {
            "initialize" => Ok(Self::Initialize(decode_initialize(msg.params()))),
            "notifications/initialized" => Ok(Self::Initialized),
            "tools/list" => Ok(Self::ToolsList),
            "tools/call" => decode_params(msg.params(), id, "tool call").map(Self::ToolsCall),
            "ping" => Ok(Self::Ping),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// Reads a tool name of any JSON type: null is empty, non-strings keep their
/// JSON text so the unknown-tool error can name them.
fn lenient_tool_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Initialise params are only logged, so a malformed payload falls back to
/// the defaults.
fn decode_initialize(params: Option<&Value>) -> InitializeParams {
    decode_params(params, None, "initialize").unwrap_or_else(|e| {
        tracing::debug!(error = %e.error.message, "Ignoring malformed initialize params");
        InitializeParams::default()
    })
}

/// Deserialises optional params, falling back to `T::default()` when absent.
fn decode_params<T>(
    params: Option<&Value>,
    id: Option<RequestId>,
    what: &str,
) -> Result<T, JsonRpcError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(p) => T::deserialize(p)
            .map_err(|e| JsonRpcError::invalid_params(id, format!("Invalid {what} params: {e}"))),
    }
}

/// Parses a JSON string into an incoming message.
///
/// # Errors
///
/// Returns a `JsonRpcError` if the JSON is malformed or not a valid message.
pub fn parse_message(json: &str) -> Result<IncomingMessage, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;
    parse_value(value)
}

/// Validates an already-parsed JSON value as an incoming message.
///
/// # Errors
///
/// Returns a `JsonRpcError` if the value is not a valid message.
pub fn parse_value(value: Value) -> Result<IncomingMessage, JsonRpcError> {
    // Check if it's an object
    let obj = value.as_object().ok_or_else(JsonRpcError::parse_error)?;

    // Check for jsonrpc field
    let jsonrpc = obj
        .get("jsonrpc")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_request(None))?;

    if jsonrpc != "2.0" {
        return Err(JsonRpcError::invalid_request(None));
    }

    // Check if this is a request (has id) or notification (no id)
    if obj.contains_key("id") {
        let request: JsonRpcRequest =
            serde_json::from_value(value).map_err(|_| JsonRpcError::invalid_request(None))?;

        if request.validate().is_some() {
            return Err(JsonRpcError::invalid_request(Some(request.id)));
        }

        Ok(IncomingMessage::Request(request))
    } else {
        let notification: JsonRpcNotification =
            serde_json::from_value(value).map_err(|_| JsonRpcError::invalid_request(None))?;

        Ok(IncomingMessage::Notification(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_request() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Request(req) = msg else {
            panic!("Expected Request, got Notification");
        };
        assert_eq!(req.id, RequestId::Number(1));
        assert_eq!(req.method, "initialize");
    }

    #[test]
    fn parse_valid_notification() {
        let json = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Notification(notif) = msg else {
            panic!("Expected Notification, got Request");
        };
        assert_eq!(notif.method, "notifications/initialized");
    }

    #[test]
    fn parse_string_id() {
        let json = r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "test"}"#;
        let msg = parse_message(json).unwrap();

        let IncomingMessage::Request(req) = msg else {
            panic!("Expected Request, got Notification");
        };
        assert_eq!(req.id, RequestId::String("abc-123".to_string()));
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse_message("not valid json").unwrap_err();
        assert_eq!(err.error.code, ErrorCode::ParseError.code());
    }

    #[test]
    fn parse_missing_jsonrpc() {
        let json = r#"{"id": 1, "method": "test"}"#;
        let err = parse_message(json).unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
    }

    #[test]
    fn parse_wrong_jsonrpc_version() {
        let json = r#"{"jsonrpc": "1.0", "id": 1, "method": "test"}"#;
        let err = parse_message(json).unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
    }

    #[test]
    fn decode_known_methods() {
        let msg = parse_message(r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#).unwrap();
        assert!(matches!(McpMethod::decode(&msg).unwrap(), McpMethod::ToolsList));

        let msg = parse_message(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
            .unwrap();
        assert!(matches!(McpMethod::decode(&msg).unwrap(), McpMethod::Initialized));

        let msg = parse_message(r#"{"jsonrpc": "2.0", "id": 3, "method": "resources/list"}"#)
            .unwrap();
        let McpMethod::Unknown(name) = McpMethod::decode(&msg).unwrap() else {
            panic!("Expected Unknown");
        };
        assert_eq!(name, "resources/list");
    }

    #[test]
    fn decode_tools_call_defaults() {
        let msg = parse_message(r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/call"}"#).unwrap();
        let McpMethod::ToolsCall(params) = McpMethod::decode(&msg).unwrap() else {
            panic!("Expected ToolsCall");
        };
        assert_eq!(params.name, "");
        assert!(params.arguments.is_null());
    }

    #[test]
    fn decode_initialize_with_client_info() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "clientInfo": {"name": "test-client", "version": "1.0.0"}
        }}"#;
        let msg = parse_message(json).unwrap();
        let McpMethod::Initialize(params) = McpMethod::decode(&msg).unwrap() else {
            panic!("Expected Initialize");
        };
        assert_eq!(params.protocol_version.as_deref(), Some("2024-11-05"));
        assert_eq!(params.client_info.unwrap().name, "test-client");
    }

    #[test]
    fn decode_rejects_non_object_tool_call_params() {
        let msg = parse_message(
            r#"{"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": [1, 2]}"#,
        )
        .unwrap();
        let err = McpMethod::decode(&msg).unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidParams.code());
        assert_eq!(err.id, Some(RequestId::Number(9)));
    }

    #[test]
    fn decode_tool_name_of_any_type() {
        let decode_name = |name: &str| {
            let json = format!(
                r#"{{"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {{"name": {name}}}}}"#
            );
            let msg = parse_message(&json).unwrap();
            let McpMethod::ToolsCall(params) = McpMethod::decode(&msg).unwrap() else {
                panic!("Expected ToolsCall");
            };
            params.name
        };
        assert_eq!(decode_name("42"), "42");
        assert_eq!(decode_name("null"), "");
        assert_eq!(decode_name(r#""snowflake_query""#), "snowflake_query");
    }

    #[test]
    fn decode_initialize_tolerates_malformed_params() {
        for params in [
            r#"{"clientInfo": {"version": "1"}}"#,
            r#"{"protocolVersion": 20241105}"#,
            "[]",
        ] {
            let json =
                format!(r#"{{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {params}}}"#);
            let msg = parse_message(&json).unwrap();
            let McpMethod::Initialize(decoded) = McpMethod::decode(&msg).unwrap() else {
                panic!("Expected Initialize");
            };
            assert!(decoded.client_info.is_none());
            assert!(decoded.protocol_version.is_none());
        }
    }

    #[test]
    fn serialise_success_response() {
        let response =
            JsonRpcResponse::success(Some(RequestId::Number(1)), serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""result":{"ok":true}"#));
    }

    #[test]
    fn serialise_response_without_id() {
        let response = JsonRpcResponse::success(None, serde_json::json!("ok"));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","result":"ok"}"#);
    }

    #[test]
    fn serialise_error_response() {
        let error = JsonRpcError::method_not_found(Some(RequestId::Number(1)), "unknown/method");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""code":-32601"#));
        assert!(json.contains("unknown/method"));
        assert!(!json.contains("result"));
    }

    #[test]
    fn outgoing_message_serialises_flat() {
        let msg = OutgoingMessage::from(JsonRpcError::unknown_tool(
            Some(RequestId::String("x".to_string())),
            "drop_tables",
        ));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["id"], "x");
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["error"]["message"], "Unknown tool: drop_tables");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::Number(42)), "42");
        assert_eq!(format!("{}", RequestId::String("abc".to_string())), "abc");
    }
}
