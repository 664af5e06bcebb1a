//! leave-query-mcp: MCP server exposing canned queries over leave records
//!
//! Clients call a single tool, `snowflake_query`, with a free-text query.
//! There is no SQL engine behind it: the query is matched against a few
//! keywords to pick one of a handful of aggregations over a fixed, in-memory
//! set of caregiver leave records, and the result comes back as a text table.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`dataset`]: Leave records and the read-only record set
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol, sessions and transports
//! - [`query`]: Query classification and aggregation

pub mod config;
pub mod dataset;
pub mod error;
pub mod mcp;
pub mod query;
