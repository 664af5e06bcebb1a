//! Error types for leave-query-mcp.
//!
//! Only startup can fail: loading the configuration and loading the dataset.
//! Everything that happens after the server is running is reported to the
//! caller as a JSON-RPC error value (see [`crate::mcp::protocol`]).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while loading the leave-record dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset file could not be read.
    #[error("failed to read dataset file: {path}")]
    ReadError {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Dataset JSON could not be parsed into leave records.
    #[error("failed to parse dataset from {origin}")]
    ParseError {
        /// Where the JSON came from (a file path or "embedded dataset").
        origin: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
