// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{Duration, Utc};

use super::ResourceLock;

#[test]
fn lock_expires_after_ttl() {
    let now = Utc::now();
    let lock = ResourceLock::new("src/lib.rs", "ada", now, 30);
    assert!(!lock.is_expired(now));
    assert!(!lock.is_expired(now + Duration::seconds(29)));
    assert!(lock.is_expired(now + Duration::seconds(30)));
    assert!(lock.is_expired(now + Duration::minutes(5)));
}

#[test]
fn lock_round_trips() {
    let lock = ResourceLock::new("docs/plan.md", "bob", Utc::now(), 600);
    let back: ResourceLock =
        serde_json::from_str(&serde_json::to_string(&lock).unwrap()).unwrap();
    assert_eq!(back, lock);
}
