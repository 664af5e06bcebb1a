//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::mcp::session::EvictionPolicy;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// JSON file with leave records; the embedded dataset is used if unset.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,

    /// Transport settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session lifetime settings.
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.sessions.idle_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "sessions.idle_timeout_secs must be greater than 0".to_string(),
            });
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "sessions.sweep_interval_secs must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Which transport the server speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTP with SSE session handshake.
    #[default]
    Http,
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport to serve on.
    #[serde(default)]
    pub transport: TransportKind,

    /// Address the HTTP transport binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP transport binds to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Parses `host` and `port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::ValidationError {
                message: format!("Invalid server host '{}'. Must be an IP address", self.host),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

/// Session lifetime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Drop sessions idle for this many seconds. Unset keeps them forever.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,

    /// How often the HTTP transport looks for idle sessions.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    /// The eviction policy these settings describe.
    #[must_use]
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.idle_timeout_secs
            .map_or(EvictionPolicy::Never, |secs| {
                EvictionPolicy::Idle(Duration::from_secs(secs))
            })
    }

    /// Sweep interval as a duration.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

const fn default_sweep_interval() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
