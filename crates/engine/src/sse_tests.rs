// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::SseHub;

#[tokio::test]
async fn broadcast_reaches_all_subscribers() {
    let hub = SseHub::new();
    let (_a, mut rx_a) = hub.subscribe(None);
    let (_b, mut rx_b) = hub.subscribe(None);

    hub.broadcast("task", &json!({"id": "task-001"}));

    let (name, payload) = rx_a.recv().await.unwrap();
    assert_eq!(name, "task");
    assert_eq!(payload["id"], "task-001");
    assert!(rx_b.recv().await.is_some());
}

#[tokio::test]
async fn channel_filter_selects_events() {
    let hub = SseHub::new();
    let (_id, mut rx) = hub.subscribe(Some("message".to_string()));

    hub.broadcast("task", &json!({}));
    hub.broadcast("message", &json!({"seq": 1}));

    let (name, _) = rx.recv().await.unwrap();
    assert_eq!(name, "message");
}

#[tokio::test]
async fn unsubscribe_removes_subscriber() {
    let hub = SseHub::new();
    let (id, mut rx) = hub.subscribe(None);
    hub.unsubscribe(id);
    assert_eq!(hub.subscriber_count(), 0);

    hub.broadcast("task", &json!({}));
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn dropped_receiver_is_detached_on_broadcast() {
    let hub = SseHub::new();
    let (_id, rx) = hub.subscribe(None);
    drop(rx);

    hub.broadcast("task", &json!({}));
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn slow_subscriber_is_detached_once_buffer_fills() {
    let hub = SseHub::new();
    let (_id, _rx) = hub.subscribe(None);

    // Never drained: fills the buffer, then the next send detaches it.
    for n in 0..=64 {
        hub.broadcast("task", &json!({ "n": n }));
    }
    assert_eq!(hub.subscriber_count(), 0);
}
