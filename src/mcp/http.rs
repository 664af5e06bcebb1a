//! HTTP transport: SSE session handshake plus JSON-RPC over POST.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/sse` | GET | Opens a session; streams one event carrying the message endpoint |
//! | `/messages/?session_id=…` | POST | One JSON-RPC message in, one envelope out |
//! | `/health` | GET | Static liveness probe |
//!
//! CORS is wide open (any origin, method and header) so browser clients can
//! talk to the server directly.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::mcp::protocol::{OutgoingMessage, SERVER_NAME};
use crate::mcp::server::McpServer;
use crate::mcp::session::EvictionPolicy;

/// Path clients POST messages to.
pub const MESSAGES_PATH: &str = "/messages/";

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Query string of the message endpoint.
#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(default)]
    session_id: Option<String>,
}

/// Builds the router with all routes and middleware.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sse", get(sse_handler))
        .route(MESSAGES_PATH, post(message_handler))
        .route("/messages", post(message_handler))
        .with_state(server)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serves the router on `addr` until Ctrl+C / SIGTERM.
///
/// If the server's session store has an idle policy, a background task sweeps
/// expired sessions every `sweep_interval`.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(
    server: Arc<McpServer>,
    addr: SocketAddr,
    sweep_interval: Duration,
) -> std::io::Result<()> {
    if let EvictionPolicy::Idle(max_idle) = server.sessions().policy() {
        tracing::info!(
            max_idle_secs = max_idle.as_secs(),
            sweep_interval_secs = sweep_interval.as_secs(),
            "Session eviction enabled"
        );
        tokio::spawn(sweep_sessions(Arc::clone(&server), sweep_interval));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP transport listening");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn sweep_sessions(server: Arc<McpServer>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        server.sessions().evict_idle(Instant::now());
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVER_NAME,
    })
}

/// Opens a session and tells the client where to send messages.
async fn sse_handler(
    State(server): State<Arc<McpServer>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = server.open_session();
    let endpoint = format!("{MESSAGES_PATH}?session_id={session_id}");

    Sse::new(stream::once(async move {
        Ok(Event::default().data(endpoint))
    }))
}

async fn message_handler(
    State(server): State<Arc<McpServer>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Json<OutgoingMessage> {
    let session_id = query.session_id.as_deref().filter(|id| !id.is_empty());
    Json(server.handle_raw(session_id, &body))
}
