//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the leave-record query engine as a single MCP tool,
//! `snowflake_query`. Messages are JSON-RPC 2.0 and can arrive over HTTP
//! (SSE handshake plus POST) or over stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌────────────────┐   │
//! │   │  Transport  │───▶│   Server    │───▶│  Query engine  │   │
//! │   │ (http/stdio)│    │ (dispatch)  │    │ (aggregations) │   │
//! │   └─────────────┘    └─────────────┘    └────────────────┘   │
//! │                             │                                │
//! │                             ▼                                │
//! │                     ┌──────────────┐                         │
//! │                     │ SessionStore │                         │
//! │                     └──────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod http;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcResponse, OutgoingMessage, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use session::{EvictionPolicy, SessionStore};
pub use transport::StdioTransport;
