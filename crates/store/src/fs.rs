// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem storage backend.
//!
//! Values live as JSON files under `kv/`, lock records under `locks/`
//! (guarded by POSIX advisory locks during test-and-set), pub/sub channels
//! as JSON-line files under `pubsub/` polled by subscribers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use masc_core::{Clock, ResourceLock, RoomError, SystemClock};

use crate::backend::{EventStream, StorageBackend};
use crate::files::{append_line, read_json, with_file_lock, write_json_atomic};
use crate::paths::encode_key;

const SUBSCRIBE_POLL_MS: u64 = 250;

/// One retained pub/sub message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PubSubEntry {
    at: DateTime<Utc>,
    payload: Value,
}

/// Filesystem-backed [`StorageBackend`] rooted at a directory
/// (conventionally the room's `.masc/`).
pub struct FsBackend<C: Clock = SystemClock> {
    root: PathBuf,
    clock: C,
}

impl FsBackend<SystemClock> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), clock: SystemClock }
    }
}

impl<C: Clock> FsBackend<C> {
    pub fn with_clock(root: impl Into<PathBuf>, clock: C) -> Self {
        Self { root: root.into(), clock }
    }

    fn kv_path(&self, key: &str) -> PathBuf {
        self.root.join("kv").join(format!("{}.json", encode_key(key)))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join("locks").join(format!("{}.json", encode_key(key)))
    }

    fn channel_path(&self, channel: &str) -> PathBuf {
        self.root.join("pubsub").join(format!("{}.jsonl", encode_key(channel)))
    }

    fn read_live_lock(&self, path: &Path) -> Result<Option<ResourceLock>, RoomError> {
        let record: Option<ResourceLock> = read_json(path)?;
        Ok(record.filter(|r| !r.is_expired(self.clock.now())))
    }
}

#[async_trait]
impl<C: Clock + 'static> StorageBackend for FsBackend<C> {
    async fn get(&self, key: &str) -> Result<Option<Value>, RoomError> {
        read_json(&self.kv_path(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), RoomError> {
        let path = self.kv_path(key);
        with_file_lock(&path, || write_json_atomic(&path, &value))
    }

    async fn delete(&self, key: &str) -> Result<bool, RoomError> {
        let path = self.kv_path(key);
        with_file_lock(&path, || match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        })
    }

    async fn acquire_lock(&self, key: &str, ttl_s: u64, owner: &str) -> Result<bool, RoomError> {
        let path = self.lock_path(key);
        let now = self.clock.now();
        with_file_lock(&path, || {
            let current: Option<ResourceLock> = read_json(&path)?;
            if let Some(record) = current {
                if !record.is_expired(now) && record.owner != owner {
                    return Ok(false);
                }
            }
            let record = ResourceLock::new(key, owner, now, ttl_s);
            write_json_atomic(&path, &record)?;
            Ok(true)
        })
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<bool, RoomError> {
        let path = self.lock_path(key);
        let now = self.clock.now();
        with_file_lock(&path, || {
            let current: Option<ResourceLock> = read_json(&path)?;
            match current {
                Some(record) if record.owner == owner => {
                    std::fs::remove_file(&path)?;
                    Ok(true)
                }
                // Expired records are fair game to clear, but a live
                // foreign owner is never mutated.
                Some(record) if record.is_expired(now) => {
                    std::fs::remove_file(&path)?;
                    Ok(false)
                }
                _ => Ok(false),
            }
        })
    }

    async fn lock_record(&self, key: &str) -> Result<Option<ResourceLock>, RoomError> {
        self.read_live_lock(&self.lock_path(key))
    }

    async fn lock_records(&self) -> Result<Vec<ResourceLock>, RoomError> {
        let dir = self.root.join("locks");
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(record) = self.read_live_lock(&path)? {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| a.resource.cmp(&b.resource));
        Ok(records)
    }

    async fn publish(&self, channel: &str, payload: Value) -> Result<(), RoomError> {
        let path = self.channel_path(channel);
        let entry = PubSubEntry { at: self.clock.now(), payload };
        let line = serde_json::to_string(&entry)?;
        with_file_lock(&path, || append_line(&path, &line))
    }

    /// Poll-based tail of the channel file. Only entries appended after the
    /// subscription starts are delivered (at-most-once, no replay).
    async fn subscribe(&self, channel: &str) -> Result<EventStream, RoomError> {
        let path = self.channel_path(channel);
        let mut offset = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let (tx, rx) = tokio::sync::mpsc::channel::<Value>(64);

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(SUBSCRIBE_POLL_MS));
            loop {
                tick.tick().await;
                let len = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                if len < offset {
                    // Channel file was cleaned up; restart from the top.
                    offset = 0;
                }
                if len == offset {
                    continue;
                }
                let Ok(content) = std::fs::read_to_string(&path) else { continue };
                let fresh = content.get(offset as usize..).unwrap_or("");
                offset = len;
                for line in fresh.lines() {
                    if let Ok(entry) = serde_json::from_str::<PubSubEntry>(line) {
                        if tx.send(entry.payload).await.is_err() {
                            debug!("pubsub subscriber dropped, ending poll");
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn cleanup_pubsub(
        &self,
        max_age_days: u32,
        max_messages: usize,
    ) -> Result<usize, RoomError> {
        let dir = self.root.join("pubsub");
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let cutoff = self.clock.now() - chrono::Duration::days(max_age_days as i64);
        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "jsonl") {
                continue;
            }
            removed += with_file_lock(&path, || {
                let content = std::fs::read_to_string(&path)?;
                let kept: Vec<&str> = {
                    let recent: Vec<&str> = content
                        .lines()
                        .filter(|line| {
                            serde_json::from_str::<PubSubEntry>(line)
                                .map(|e| e.at >= cutoff)
                                .unwrap_or(false)
                        })
                        .collect();
                    let skip = recent.len().saturating_sub(max_messages);
                    recent.into_iter().skip(skip).collect()
                };
                let dropped = content.lines().count() - kept.len();
                let mut out = kept.join("\n");
                if !out.is_empty() {
                    out.push('\n');
                }
                std::fs::write(&path, out)?;
                Ok(dropped)
            })?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
