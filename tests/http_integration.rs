//! Integration tests for the HTTP transport.
//!
//! Requests are driven straight through the router with `tower::ServiceExt`,
//! no socket involved.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use leave_query_mcp::dataset::RecordSet;
use leave_query_mcp::mcp::{http, McpServer, SessionStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Arc<McpServer>, Router) {
    let server = Arc::new(McpServer::new(
        Arc::new(RecordSet::embedded().unwrap()),
        SessionStore::default(),
    ));
    let router = http::router(Arc::clone(&server));
    (server, router)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn post_message(router: Router, uri: &str, body: &Value) -> Value {
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (_, router) = app();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({"status": "healthy", "service": "leave-query-mcp"}));
}

#[tokio::test]
async fn sse_opens_a_session() {
    let (server, router) = app();
    let response = router
        .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = body_string(response).await;
    let endpoint = body
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let session_id = endpoint
        .strip_prefix("/messages/?session_id=")
        .unwrap();

    assert_eq!(server.sessions().len(), 1);
    assert!(server.sessions().get(session_id).is_some());
    assert!(!server.sessions().is_initialized(session_id));
}

#[tokio::test]
async fn message_endpoint_initialises_session() {
    let (server, router) = app();
    let session = server.open_session();

    let reply = post_message(
        router,
        &format!("/messages/?session_id={session}"),
        &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;

    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["serverInfo"]["name"], "leave-query-mcp");
    assert!(server.sessions().is_initialized(&session));
    assert_eq!(server.sessions().len(), 1);
}

#[tokio::test]
async fn message_without_session_id_still_answers() {
    let (server, router) = app();

    let reply = post_message(
        router,
        "/messages/",
        &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;

    assert_eq!(reply["result"]["tools"][0]["name"], "snowflake_query");
    assert!(server.sessions().is_empty());
}

#[tokio::test]
async fn notification_gets_acknowledged() {
    let (_, router) = app();

    let reply = post_message(
        router,
        "/messages/?session_id=abc",
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;

    assert_eq!(reply, json!({"jsonrpc": "2.0", "result": "ok"}));
}

#[tokio::test]
async fn tool_call_over_http() {
    let (_, router) = app();

    let reply = post_message(
        router,
        "/messages/?session_id=abc",
        &json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "snowflake_query",
                           "arguments": {"query": "SELECT caregiver_type, COUNT(*)"}}}),
    )
    .await;

    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    let separator = "-".repeat(50);
    assert_eq!(reply["result"]["content"][0]["type"], "text");
    assert_eq!(
        text,
        [
            "CAREGIVER_TYPE | COUNT",
            separator.as_str(),
            "CHILD_U18 | 4",
            "PARENT | 9",
            "CHILD_O18 | 1",
            "SPOUSE | 1",
        ]
        .join("\n")
    );
}

#[tokio::test]
async fn unknown_tool_over_http() {
    let (_, router) = app();

    let reply = post_message(
        router,
        "/messages/?session_id=abc",
        &json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": {"name": "nope", "arguments": {}}}),
    )
    .await;

    assert_eq!(reply["error"]["code"], -32601);
    assert_eq!(reply["error"]["message"], "Unknown tool: nope");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let (_, router) = app();
    let response = router
        .oneshot(
            Request::post("/messages/?session_id=abc")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await
        .unwrap();

    let reply: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(reply["error"]["code"], -32700);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (_, router) = app();
    let response = router
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://example.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
