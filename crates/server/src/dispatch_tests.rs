// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use masc_core::FakeClock;
use masc_engine::{Coordinator, RoomConfig};
use masc_mcp::FeatureModes;

use crate::metrics::Metrics;

use super::Dispatcher;

fn dispatcher() -> (tempfile::TempDir, Dispatcher<FakeClock>, FakeClock) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let coord = Arc::new(Coordinator::with_clock(dir.path(), RoomConfig::default(), clock.clone()));
    let d = Dispatcher::new(coord, Arc::new(Metrics::new()), FeatureModes::full());
    (dir, d, clock)
}

async fn call(d: &Dispatcher<FakeClock>, name: &str, args: Value) -> (bool, String) {
    let cancel = CancellationToken::new();
    d.dispatch(name, &args, "test-session", &cancel).await
}

async fn setup_room(d: &Dispatcher<FakeClock>) {
    let (ok, _) = call(d, "masc_init", json!({"project": "demo"})).await;
    assert!(ok);
    let (ok, _) = call(d, "masc_join", json!({"agent_name": "ada", "agent_type": "rust"})).await;
    assert!(ok);
}

#[tokio::test]
async fn init_twice_second_is_noop() {
    let (_dir, d, _clock) = dispatcher();
    let (ok, text) = call(&d, "masc_init", json!({"project": "demo"})).await;
    assert!(ok);
    assert!(text.starts_with("✅"));

    let (ok, text) = call(&d, "masc_init", json!({"project": "demo"})).await;
    assert!(ok);
    assert!(text.contains("already initialized"), "{text}");
}

#[tokio::test]
async fn unknown_tool_is_reported() {
    let (_dir, d, _clock) = dispatcher();
    let (ok, text) = call(&d, "masc_explode", json!({})).await;
    assert!(!ok);
    assert_eq!(text, "Unknown tool: masc_explode");
}

#[tokio::test]
async fn join_gate_blocks_then_admits() {
    let (_dir, d, _clock) = dispatcher();
    call(&d, "masc_init", json!({"project": "demo"})).await;

    // S6: claim before join fails with join guidance
    let (ok, text) =
        call(&d, "masc_claim", json!({"task_id": "task-001", "agent_name": "ada"})).await;
    assert!(!ok);
    assert!(text.starts_with("❌ Join required"), "{text}");

    call(&d, "masc_join", json!({"agent_name": "ada", "agent_type": "rust"})).await;
    call(&d, "masc_add_task", json!({"title": "work", "agent_name": "ada"})).await;
    let (ok, text) =
        call(&d, "masc_claim", json!({"task_id": "task-001", "agent_name": "ada"})).await;
    assert!(ok, "{text}");
    assert!(text.starts_with("✅ task-001 todo → claimed"), "{text}");
}

#[tokio::test]
async fn transition_with_cas_reports_version_mismatch() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    call(&d, "masc_join", json!({"agent_name": "bob", "agent_type": "rust"})).await;
    call(&d, "masc_add_task", json!({"title": "contested", "agent_name": "ada"})).await;

    // S1: two claims racing on the same expected_version
    let args = json!({
        "task_id": "task-001", "action": "claim",
        "agent_name": "ada", "expected_version": 1,
    });
    let (ok, text) = call(&d, "masc_transition", args.clone()).await;
    assert!(ok);
    assert!(text.starts_with("✅ task-001 todo → claimed"), "{text}");

    let mut second = args;
    second["agent_name"] = json!("bob");
    let (ok, text) = call(&d, "masc_transition", second).await;
    assert!(!ok);
    assert!(text.contains("Version mismatch"), "{text}");
}

#[tokio::test]
async fn add_rejects_out_of_range_priority() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    let (ok, text) =
        call(&d, "masc_add_task", json!({"title": "bad", "priority": 9, "agent_name": "ada"})).await;
    assert!(!ok);
    assert!(text.contains("out of range"), "{text}");
}

#[tokio::test]
async fn cache_round_trips_within_ttl() {
    let (_dir, d, _clock) = dispatcher();
    call(&d, "masc_init", json!({"project": "demo"})).await;

    let (ok, _) = call(
        &d,
        "masc_cache_set",
        json!({"key": "cfg", "value": {"mode": 2}, "ttl_s": 60, "agent_name": "ada"}),
    )
    .await;
    assert!(ok);

    let (ok, text) = call(&d, "masc_cache_get", json!({"key": "cfg", "agent_name": "ada"})).await;
    assert!(ok);
    assert!(text.contains("\"mode\":2"), "{text}");

    let (ok, text) =
        call(&d, "masc_cache_get", json!({"key": "absent", "agent_name": "ada"})).await;
    assert!(ok);
    assert!(text.contains("Cache miss"), "{text}");
}

#[tokio::test]
async fn wait_for_message_zero_timeout_returns_immediately() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    let (ok, text) = call(
        &d,
        "masc_wait_for_message",
        json!({"timeout_s": 0, "agent_name": "ada"}),
    )
    .await;
    assert!(ok);
    assert!(text.contains("No message"), "{text}");
}

#[tokio::test]
async fn broadcast_then_check_messages_delivers_fifo() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    call(&d, "masc_join", json!({"agent_name": "bob", "agent_type": "rust"})).await;

    call(&d, "masc_broadcast", json!({"content": "hello", "agent_name": "ada"})).await;
    call(&d, "masc_broadcast", json!({"content": "world", "agent_name": "ada"})).await;

    let (ok, text) = call(&d, "masc_check_messages", json!({"agent_name": "bob"})).await;
    assert!(ok);
    let hello = text.find("hello").unwrap();
    let world = text.find("world").unwrap();
    assert!(hello < world, "FIFO order violated: {text}");
}

#[tokio::test]
async fn broadcast_rate_limit_refuses_with_wait_hint() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;

    // Worker broadcast burst is 3 (joins consume General, not Broadcast)
    for n in 0..3 {
        let (ok, text) =
            call(&d, "masc_broadcast", json!({"content": format!("m{n}"), "agent_name": "ada"}))
                .await;
        assert!(ok, "{text}");
    }
    let (ok, text) =
        call(&d, "masc_broadcast", json!({"content": "over", "agent_name": "ada"})).await;
    assert!(!ok);
    assert!(text.contains("Rate limited"), "{text}");

    // Refusal did not persist the message
    let messages = d.coordinator().store().list_messages(0, 50).unwrap();
    assert!(!messages.iter().any(|m| m.content == "over"));
}

#[tokio::test]
async fn lock_conflict_names_holder() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    call(&d, "masc_join", json!({"agent_name": "bob", "agent_type": "rust"})).await;

    let (ok, _) = call(&d, "masc_lock", json!({"resource": "f", "agent_name": "ada"})).await;
    assert!(ok);
    let (ok, text) = call(&d, "masc_lock", json!({"resource": "f", "agent_name": "bob"})).await;
    assert!(!ok);
    assert!(text.contains("locked by ada"), "{text}");

    let (ok, text) = call(&d, "masc_unlock", json!({"resource": "f", "agent_name": "bob"})).await;
    assert!(!ok, "{text}");
    let (ok, _) = call(&d, "masc_unlock", json!({"resource": "f", "agent_name": "ada"})).await;
    assert!(ok);
}

#[tokio::test]
async fn planning_flow_logs_and_resolves_errors() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    call(&d, "masc_add_task", json!({"title": "work", "agent_name": "ada"})).await;

    let (ok, _) = call(
        &d,
        "masc_plan_set",
        json!({"task_id": "task-001", "plan": "1. do it", "agent_name": "ada"}),
    )
    .await;
    assert!(ok);
    call(
        &d,
        "masc_plan_error",
        json!({"task_id": "task-001", "message": "broken", "agent_name": "ada"}),
    )
    .await;
    let (ok, _) = call(
        &d,
        "masc_plan_resolve_error",
        json!({"task_id": "task-001", "index": 0, "agent_name": "ada"}),
    )
    .await;
    assert!(ok);

    let (ok, text) =
        call(&d, "masc_plan_get", json!({"task_id": "task-001", "agent_name": "ada"})).await;
    assert!(ok);
    assert!(text.contains("\"resolved\": true"), "{text}");
}

#[tokio::test]
async fn identity_is_generated_and_persisted_per_session() {
    let (_dir, d, _clock) = dispatcher();
    call(&d, "masc_init", json!({"project": "demo"})).await;

    // No agent_name: a fresh identity is generated and persisted.
    call(&d, "masc_status", json!({})).await;
    let first = d.coordinator().store().read_session_identity("test-session").unwrap().unwrap();
    assert!(first.starts_with("agent-"));

    // Second call under the same session resolves the same identity.
    call(&d, "masc_status", json!({})).await;
    let second = d.coordinator().store().read_session_identity("test-session").unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn join_persists_nickname_for_session() {
    let (_dir, d, _clock) = dispatcher();
    call(&d, "masc_init", json!({"project": "demo"})).await;

    let (ok, text) = call(&d, "masc_join", json!({"agent_type": "rust"})).await;
    assert!(ok);
    let name = d.coordinator().store().read_session_identity("test-session").unwrap().unwrap();
    assert!(name.starts_with("rust-"), "{name}");
    assert!(text.contains(&name), "{text} vs {name}");
}

#[tokio::test]
async fn every_call_heartbeats_the_agent() {
    let (_dir, d, clock) = dispatcher();
    setup_room(&d).await;
    let before = d.coordinator().store().load_agent("ada").unwrap().unwrap().last_seen;

    clock.advance(chrono::Duration::seconds(30));
    call(&d, "masc_status", json!({"agent_name": "ada"})).await;
    let after = d.coordinator().store().load_agent("ada").unwrap().unwrap().last_seen;
    assert_eq!(after - before, chrono::Duration::seconds(30));
}

#[tokio::test]
async fn leave_when_not_joined_is_informative_noop() {
    let (_dir, d, _clock) = dispatcher();
    call(&d, "masc_init", json!({"project": "demo"})).await;
    let (ok, text) = call(&d, "masc_leave", json!({"agent_name": "ghost"})).await;
    assert!(ok);
    assert!(text.contains("not in the room"), "{text}");
}

#[tokio::test]
async fn audit_records_tool_calls() {
    let (_dir, d, _clock) = dispatcher();
    setup_room(&d).await;
    let events = d.coordinator().events.recent(10).unwrap();
    assert!(events
        .iter()
        .any(|e| e.event_type == "tool_call" && e.detail.as_deref() == Some("masc_join")));
}
