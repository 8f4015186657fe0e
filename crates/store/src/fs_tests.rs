// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Duration;
use futures_util::StreamExt;
use serde_json::json;
use tempfile::tempdir;

use masc_core::FakeClock;

use super::{FsBackend, StorageBackend};

fn backend(dir: &std::path::Path) -> (FsBackend<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (FsBackend::with_clock(dir, clock.clone()), clock)
}

#[tokio::test]
async fn kv_set_get_delete() {
    let dir = tempdir().unwrap();
    let (backend, _clock) = backend(dir.path());

    assert!(backend.get("missing").await.unwrap().is_none());
    backend.set("cfg", json!({"mode": "full"})).await.unwrap();
    assert_eq!(backend.get("cfg").await.unwrap().unwrap()["mode"], "full");

    assert!(backend.delete("cfg").await.unwrap());
    assert!(!backend.delete("cfg").await.unwrap());
    assert!(backend.get("cfg").await.unwrap().is_none());
}

#[tokio::test]
async fn lock_is_exclusive_until_expired() {
    let dir = tempdir().unwrap();
    let (backend, clock) = backend(dir.path());

    assert!(backend.acquire_lock("locks:f", 1, "a").await.unwrap());
    assert!(!backend.acquire_lock("locks:f", 1, "b").await.unwrap());

    // Same owner refreshes
    assert!(backend.acquire_lock("locks:f", 10, "a").await.unwrap());

    // After expiry another owner can take it (S3 shape)
    clock.advance(Duration::seconds(11));
    assert!(backend.acquire_lock("locks:f", 1, "b").await.unwrap());
    let record = backend.lock_record("locks:f").await.unwrap().unwrap();
    assert_eq!(record.owner, "b");
}

#[tokio::test]
async fn release_by_non_owner_never_mutates_ownership() {
    let dir = tempdir().unwrap();
    let (backend, _clock) = backend(dir.path());

    assert!(backend.acquire_lock("locks:f", 60, "a").await.unwrap());
    assert!(!backend.release_lock("locks:f", "b").await.unwrap());
    assert_eq!(backend.lock_record("locks:f").await.unwrap().unwrap().owner, "a");

    assert!(backend.release_lock("locks:f", "a").await.unwrap());
    assert!(backend.lock_record("locks:f").await.unwrap().is_none());
    // Idempotent
    assert!(!backend.release_lock("locks:f", "a").await.unwrap());
}

#[tokio::test]
async fn expired_records_are_invisible() {
    let dir = tempdir().unwrap();
    let (backend, clock) = backend(dir.path());

    backend.acquire_lock("locks:f", 1, "a").await.unwrap();
    clock.advance(Duration::seconds(2));
    assert!(backend.lock_record("locks:f").await.unwrap().is_none());
    assert!(backend.lock_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn lock_records_lists_live_sorted() {
    let dir = tempdir().unwrap();
    let (backend, _clock) = backend(dir.path());

    backend.acquire_lock("locks:b.rs", 60, "a").await.unwrap();
    backend.acquire_lock("locks:a.rs", 60, "b").await.unwrap();
    let records = backend.lock_records().await.unwrap();
    let resources: Vec<&str> = records.iter().map(|r| r.resource.as_str()).collect();
    assert_eq!(resources, vec!["locks:a.rs", "locks:b.rs"]);
}

#[tokio::test]
async fn subscribe_sees_only_messages_after_subscription() {
    let dir = tempdir().unwrap();
    let (backend, _clock) = backend(dir.path());

    backend.publish("events", json!({"n": 0})).await.unwrap();
    let mut stream = backend.subscribe("events").await.unwrap();
    backend.publish("events", json!({"n": 1})).await.unwrap();
    backend.publish("events", json!({"n": 2})).await.unwrap();

    let first = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first["n"], 1);
    let second = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second["n"], 2);
}

#[tokio::test]
async fn cleanup_pubsub_prunes_by_age_and_count() {
    let dir = tempdir().unwrap();
    let (backend, clock) = backend(dir.path());

    backend.publish("events", json!({"n": 0})).await.unwrap();
    clock.advance(Duration::days(10));
    for n in 1..=5 {
        backend.publish("events", json!({ "n": n })).await.unwrap();
    }

    // n=0 is too old; count cap keeps the 3 most recent of the rest.
    let removed = backend.cleanup_pubsub(7, 3).await.unwrap();
    assert_eq!(removed, 3);
    let removed_again = backend.cleanup_pubsub(7, 3).await.unwrap();
    assert_eq!(removed_again, 0);
}
