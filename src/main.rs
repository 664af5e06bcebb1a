//! leave-query-mcp: MCP server exposing canned queries over leave records
//!
//! Serves the `snowflake_query` tool over HTTP (default) or stdio.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use leave_query_mcp::config::{self, Config, TransportKind};
use leave_query_mcp::dataset::RecordSet;
use leave_query_mcp::mcp::{http, McpServer, SessionStore, StdioTransport};

/// MCP server exposing canned warehouse-style queries over leave records.
#[derive(Parser, Debug)]
#[command(name = "leave-query-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Transport to serve on (overrides the config file)
    #[arg(short, long, value_enum)]
    transport: Option<TransportKind>,

    /// HTTP bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// HTTP port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON file with leave records (overrides the config file)
    #[arg(long, value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, cfg: &mut Config) {
        if let Some(transport) = self.transport {
            cfg.server.transport = transport;
        }
        if let Some(host) = &self.host {
            cfg.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(dataset) = &self.dataset {
            cfg.dataset_path = Some(dataset.clone());
        }
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "info" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO, // Default to info for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs always go to stderr so stdout stays free for the stdio transport.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the leave-query-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut cfg);

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting leave-query-mcp server"
    );

    let records = match RecordSet::load(cfg.dataset_path.as_deref()) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to load dataset");
            return ExitCode::FAILURE;
        }
    };

    let source = cfg
        .dataset_path
        .as_ref()
        .map_or_else(|| "embedded".to_string(), |p| p.display().to_string());
    info!(records = records.len(), source = %source, "Loaded leave records");

    let server = Arc::new(McpServer::new(
        Arc::new(records),
        SessionStore::new(cfg.sessions.eviction_policy()),
    ));

    // Run the server
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = match cfg.server.transport {
        TransportKind::Stdio => runtime.block_on(server.serve_stdio(StdioTransport::new())),
        TransportKind::Http => match cfg.server.socket_addr() {
            Ok(addr) => runtime.block_on(http::serve(
                Arc::clone(&server),
                addr,
                cfg.sessions.sweep_interval(),
            )),
            Err(e) => {
                error!(error = %e, "Invalid server address");
                return ExitCode::FAILURE;
            }
        },
    };

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
