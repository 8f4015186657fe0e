// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic storage backend interface.
//!
//! The engine consumes this narrow contract: key/value documents, TTL
//! advisory locks with owner attribution, and best-effort pub/sub. The
//! filesystem backend in [`crate::fs`] is the reference implementation;
//! a distributed key-value store with conditional writes satisfies the
//! same trait.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use masc_core::{ResourceLock, RoomError};

/// Stream of pub/sub payloads. Delivery is at-most-once; reconnection and
/// replay are the subscriber's responsibility.
pub type EventStream = BoxStream<'static, Value>;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, RoomError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), RoomError>;

    /// Remove a key; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, RoomError>;

    /// Atomic test-and-set lock acquire. Returns `false` when another live
    /// (non-expired) owner holds the key. Re-acquiring by the same owner
    /// refreshes the TTL.
    async fn acquire_lock(&self, key: &str, ttl_s: u64, owner: &str) -> Result<bool, RoomError>;

    /// Idempotent release; returns `false` when the key is not held by
    /// `owner`. Releasing by a non-owner never mutates ownership.
    async fn release_lock(&self, key: &str, owner: &str) -> Result<bool, RoomError>;

    /// Current live lock record for owner attribution, if any.
    async fn lock_record(&self, key: &str) -> Result<Option<ResourceLock>, RoomError>;

    /// All live lock records (for listings).
    async fn lock_records(&self) -> Result<Vec<ResourceLock>, RoomError>;

    async fn publish(&self, channel: &str, payload: Value) -> Result<(), RoomError>;

    async fn subscribe(&self, channel: &str) -> Result<EventStream, RoomError>;

    /// Prune retained pub/sub messages by age and count; returns how many
    /// were removed.
    async fn cleanup_pubsub(
        &self,
        max_age_days: u32,
        max_messages: usize,
    ) -> Result<usize, RoomError>;
}
