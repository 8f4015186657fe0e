// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, VARY};
use axum::http::{HeaderMap, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use masc_core::FakeClock;
use masc_engine::{Coordinator, RoomConfig};
use masc_mcp::FeatureModes;

use crate::dispatch::Dispatcher;
use crate::mcp::McpServer;
use crate::metrics::Metrics;

use super::{accepts_zstd, build_router, HttpState};

const TEST_MAX_BODY: usize = 1024;

fn test_server() -> (tempfile::TempDir, TestServer, Arc<HttpState<FakeClock>>) {
    let dir = tempdir().unwrap();
    let coord = Arc::new(Coordinator::with_clock(
        dir.path(),
        RoomConfig::default(),
        FakeClock::new(),
    ));
    let metrics = Arc::new(Metrics::new());
    let dispatcher =
        Arc::new(Dispatcher::new(coord, Arc::clone(&metrics), FeatureModes::full()));
    let state = Arc::new(HttpState {
        server: Arc::new(McpServer::new(dispatcher)),
        metrics,
        max_body_bytes: TEST_MAX_BODY,
        cancel: CancellationToken::new(),
    });
    let server = TestServer::new(build_router(Arc::clone(&state))).unwrap();
    (dir, server, state)
}

fn rpc(method: &str, id: i64, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[tokio::test]
async fn health_and_ready_report_ok() {
    let (_dir, server, _state) = test_server();

    let health: Value = server.get("/health").await.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["server"], "masc");
    assert!(health["version"].is_string());

    let ready: Value = server.get("/ready").await.json();
    assert_eq!(ready["status"], "ready");
}

#[tokio::test]
async fn root_serves_static_identifier() {
    let (_dir, server, _state) = test_server();
    let response = server.get("/").await;
    assert_eq!(response.text(), "masc MCP server");
}

#[tokio::test]
async fn unknown_path_is_404_and_method_mismatch_405() {
    let (_dir, server, _state) = test_server();
    assert_eq!(server.get("/nope").await.status_code(), 404);
    assert_eq!(server.get("/mcp").await.status_code(), 405);
}

#[tokio::test]
async fn metrics_exposes_prometheus_text() {
    let (_dir, server, _state) = test_server();
    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("# TYPE masc_tool_calls_total counter"));
}

#[tokio::test]
async fn mcp_post_speaks_jsonrpc() {
    let (_dir, server, _state) = test_server();
    let response = server
        .post("/mcp")
        .json(&rpc("initialize", 1, json!({"protocolVersion": "2025-03-26"})))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["serverInfo"]["name"], "masc");
}

#[tokio::test]
async fn notifications_yield_204() {
    let (_dir, server, _state) = test_server();
    let response = server
        .post("/mcp")
        .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    assert_eq!(response.status_code(), 204);
}

#[tokio::test]
async fn body_at_limit_ok_one_byte_over_413() {
    let (_dir, server, _state) = test_server();

    // Build a valid request padded to exactly the limit.
    let mut body = rpc("tools/list", 1, json!({})).to_string();
    let pad = TEST_MAX_BODY - body.len();
    body.insert_str(body.len() - 1, &" ".repeat(pad));
    assert_eq!(body.len(), TEST_MAX_BODY);
    let response = server
        .post("/mcp")
        .bytes(body.clone().into_bytes().into())
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), 200);

    body.insert(body.len() - 1, ' ');
    let response = server
        .post("/mcp")
        .bytes(body.into_bytes().into())
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), 413);
}

#[tokio::test]
async fn zstd_negotiation_sets_encoding_and_vary() {
    let (_dir, server, _state) = test_server();
    let response = server
        .post("/mcp")
        .add_header(ACCEPT_ENCODING, HeaderValue::from_static("gzip, zstd"))
        .json(&rpc("tools/list", 1, json!({})))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header(CONTENT_ENCODING), "zstd");
    assert_eq!(response.header(VARY), "Accept-Encoding");

    let decompressed = zstd::decode_all(response.as_bytes().as_ref()).unwrap();
    let body: Value = serde_json::from_slice(&decompressed).unwrap();
    assert!(body["result"]["tools"].is_array());
}

#[tokio::test]
async fn identity_encoding_without_zstd() {
    let (_dir, server, _state) = test_server();
    let response = server.post("/mcp").json(&rpc("tools/list", 1, json!({}))).await;
    assert!(response.maybe_header(CONTENT_ENCODING).is_none());
    let body: Value = response.json();
    assert!(body["result"]["tools"].is_array());
}

#[tokio::test]
async fn session_header_keys_identity_persistence() {
    let (_dir, server, state) = test_server();
    server
        .post("/mcp")
        .add_header(
            axum::http::HeaderName::from_static("mcp-session-id"),
            HeaderValue::from_static("sess-42"),
        )
        .json(&rpc("tools/call", 1, json!({"name": "masc_init", "arguments": {"project": "demo"}})))
        .await;

    let store = state.server.dispatcher().coordinator().store();
    let identity = store.read_session_identity("sess-42").unwrap();
    assert!(identity.is_some(), "session identity was not persisted");
}

#[tokio::test]
async fn sse_clients_gauge_tracks_subscribers() {
    let (_dir, _server, state) = test_server();
    // The SSE handler wires hub subscription to the gauge via a drop guard;
    // exercise the guard directly.
    let hub = Arc::clone(state.server.dispatcher().coordinator().events.hub());
    let (id, rx) = hub.subscribe(None);
    assert_eq!(hub.subscriber_count(), 1);
    drop(rx);
    hub.unsubscribe(id);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn accepts_zstd_parses_header_variants() {
    let mut headers = HeaderMap::new();
    assert!(!accepts_zstd(&headers));

    headers.insert("accept-encoding", "gzip, br".parse().unwrap());
    assert!(!accepts_zstd(&headers));

    headers.insert("accept-encoding", "zstd".parse().unwrap());
    assert!(accepts_zstd(&headers));

    headers.insert("accept-encoding", "gzip, ZSTD;q=0.9".parse().unwrap());
    assert!(accepts_zstd(&headers));

    headers.insert("accept-encoding", "zstd-dict".parse().unwrap());
    assert!(accepts_zstd(&headers));

    headers.insert("accept-encoding", "notzstd".parse().unwrap());
    assert!(!accepts_zstd(&headers));
}
