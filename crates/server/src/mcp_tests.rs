// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use masc_core::FakeClock;
use masc_engine::{Coordinator, RoomConfig};
use masc_mcp::FeatureModes;

use crate::dispatch::Dispatcher;
use crate::metrics::Metrics;

use super::McpServer;

fn server() -> (tempfile::TempDir, McpServer<FakeClock>) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let coord = Arc::new(Coordinator::with_clock(dir.path(), RoomConfig::default(), clock));
    let dispatcher = Arc::new(Dispatcher::new(coord, Arc::new(Metrics::new()), FeatureModes::full()));
    (dir, McpServer::new(dispatcher))
}

async fn send(server: &McpServer<FakeClock>, value: Value) -> Option<Value> {
    let cancel = CancellationToken::new();
    server.handle(value.to_string().as_bytes(), "test", &cancel).await
}

async fn call_tool(server: &McpServer<FakeClock>, name: &str, args: Value) -> Value {
    let resp = send(
        server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
               "params": {"name": name, "arguments": args}}),
    )
    .await
    .unwrap();
    resp["result"].clone()
}

#[tokio::test]
async fn initialize_negotiates_known_version() {
    let (_dir, server) = server();
    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
               "params": {"protocolVersion": "2024-11-05"}}),
    )
    .await
    .unwrap();
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(resp["result"]["serverInfo"]["name"], "masc");
    assert!(resp["result"]["instructions"].as_str().unwrap().contains("masc_join"));
}

#[tokio::test]
async fn initialize_unknown_version_echoes_server_version() {
    let (_dir, server) = server();
    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
               "params": {"protocolVersion": "1999-01-01"}}),
    )
    .await
    .unwrap();
    assert_eq!(resp["result"]["protocolVersion"], masc_core::PROTOCOL_VERSION);
}

#[tokio::test]
async fn initialize_without_version_is_invalid_params() {
    let (_dir, server) = server();
    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await
    .unwrap();
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn protocol_errors_match_the_contract() {
    let (_dir, server) = server();

    // S5: bad version → -32600
    let resp = send(&server, json!({"jsonrpc": "1.0", "method": "initialize", "id": 1}))
        .await
        .unwrap();
    assert_eq!(resp["error"]["code"], -32600);

    // S5: invalid JSON → -32700 with null id
    let cancel = CancellationToken::new();
    let resp = server.handle(b"{not json", "test", &cancel).await.unwrap();
    assert_eq!(resp["error"]["code"], -32700);
    assert!(resp["id"].is_null());

    // S5: unknown method → -32601 echoing id
    let resp = send(&server, json!({"jsonrpc": "2.0", "method": "nope", "id": 2}))
        .await
        .unwrap();
    assert_eq!(resp["error"]["code"], -32601);
    assert_eq!(resp["id"], 2);
}

#[tokio::test]
async fn notifications_get_no_response() {
    let (_dir, server) = server();
    assert!(send(&server, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await
        .is_none());
    // Peer responses are dropped silently
    assert!(send(&server, json!({"jsonrpc": "2.0", "id": 9, "result": {}})).await.is_none());
}

#[tokio::test]
async fn tools_list_respects_feature_modes() {
    let dir = tempdir().unwrap();
    let coord = Arc::new(Coordinator::with_clock(
        dir.path(),
        RoomConfig::default(),
        FakeClock::new(),
    ));
    let dispatcher =
        Arc::new(Dispatcher::new(coord, Arc::new(Metrics::new()), FeatureModes::minimal()));
    let server = McpServer::new(dispatcher);

    let resp = send(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await
        .unwrap();
    let tools = resp["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert!(names.contains(&"masc_transition"));
    assert!(!names.contains(&"masc_broadcast"));
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn tool_failures_are_successful_responses_with_is_error() {
    let (_dir, server) = server();
    let result = call_tool(&server, "masc_status", json!({"agent_name": "ada"})).await;
    // Room not initialized yet → tool error, not a JSON-RPC error
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("not initialized"), "{text}");
}

#[tokio::test]
async fn full_tool_flow_over_the_protocol() {
    let (_dir, server) = server();
    call_tool(&server, "masc_init", json!({"project": "demo"})).await;
    call_tool(&server, "masc_join", json!({"agent_name": "a", "agent_type": "rust"})).await;
    call_tool(&server, "masc_add_task", json!({"title": "wire it", "agent_name": "a"})).await;

    let result = call_tool(
        &server,
        "masc_transition",
        json!({"task_id": "task-001", "action": "claim", "agent_name": "a", "expected_version": 1}),
    )
    .await;
    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("✅ task-001 todo → claimed"), "{text}");
}

#[tokio::test]
async fn resources_read_serves_messages_most_recent_first() {
    let (_dir, server) = server();
    call_tool(&server, "masc_init", json!({"project": "demo"})).await;
    call_tool(&server, "masc_join", json!({"agent_name": "a", "agent_type": "rust"})).await;
    call_tool(&server, "masc_broadcast", json!({"content": "hello", "agent_name": "a"})).await;
    call_tool(&server, "masc_broadcast", json!({"content": "world", "agent_name": "a"})).await;

    // S2: limit=2, most-recent-first, both from agent a
    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read",
               "params": {"uri": "masc://messages.json?limit=2"}}),
    )
    .await
    .unwrap();
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    let messages: Vec<Value> = serde_json::from_str(text).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "world");
    assert_eq!(messages[1]["content"], "hello");
    assert!(messages.iter().all(|m| m["from_agent"] == "a"));
    assert_eq!(resp["result"]["contents"][0]["mimeType"], "application/json");
}

#[tokio::test]
async fn unknown_resource_is_invalid_params() {
    let (_dir, server) = server();
    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "resources/read",
               "params": {"uri": "masc://bogus"}}),
    )
    .await
    .unwrap();
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn resources_list_and_templates_are_static() {
    let (_dir, server) = server();
    let resp = send(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}))
        .await
        .unwrap();
    assert!(resp["result"]["resources"].as_array().unwrap().len() >= 16);

    let resp = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "resources/templates/list"}),
    )
    .await
    .unwrap();
    assert!(!resp["result"]["resourceTemplates"].as_array().unwrap().is_empty());

    let resp = send(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/list"}))
        .await
        .unwrap();
    assert_eq!(resp["result"]["prompts"], json!([]));
}
