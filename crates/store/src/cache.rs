// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL key/value cache under `<base>/.masc/cache/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use masc_core::RoomError;

use crate::files::{read_json, with_file_lock, write_json_atomic};
use crate::room::RoomStore;

/// One cache entry; expired entries are removed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_s: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.stored_at + chrono::Duration::seconds(self.ttl_s as i64)
    }
}

impl RoomStore {
    pub fn cache_set(
        &self,
        key: &str,
        value: Value,
        ttl_s: u64,
        now: DateTime<Utc>,
    ) -> Result<(), RoomError> {
        let path = self.paths().cache_entry(key);
        let entry = CacheEntry { value, stored_at: now, ttl_s };
        with_file_lock(&path, || write_json_atomic(&path, &entry))
    }

    /// Hit within TTL returns the stored value; an expired entry is removed
    /// and reads as a miss.
    pub fn cache_get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, RoomError> {
        let path = self.paths().cache_entry(key);
        with_file_lock(&path, || {
            let entry: Option<CacheEntry> = read_json(&path)?;
            match entry {
                Some(entry) if entry.is_expired(now) => {
                    let _ = std::fs::remove_file(&path);
                    Ok(None)
                }
                Some(entry) => Ok(Some(entry.value)),
                None => Ok(None),
            }
        })
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
