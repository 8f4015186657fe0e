// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory resource locks over the storage backend.
//!
//! Keys are `locks:<validated-resource>`; records carry owner attribution
//! so a refused acquire can say who holds the file.

use std::sync::Arc;

use masc_core::{validate_resource, ResourceLock, RoomError};
use masc_store::StorageBackend;

const LOCK_KEY_PREFIX: &str = "locks:";

pub struct LockManager {
    backend: Arc<dyn StorageBackend>,
}

impl LockManager {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Acquire a TTL lock on `resource` for `owner`. On conflict the error
    /// names the current holder (`"unknown"` when the record vanished
    /// between the refusal and the read).
    pub async fn acquire(
        &self,
        resource: &str,
        owner: &str,
        ttl_s: u64,
    ) -> Result<ResourceLock, RoomError> {
        validate_resource(resource)?;
        let key = format!("{LOCK_KEY_PREFIX}{resource}");

        if self.backend.acquire_lock(&key, ttl_s, owner).await? {
            let record = self.backend.lock_record(&key).await?;
            Ok(record
                .map(|r| strip_prefix(r))
                .unwrap_or_else(|| {
                    // Acquire succeeded; reconstruct the record if a racing
                    // cleanup removed it before the read.
                    ResourceLock::new(resource, owner, chrono::Utc::now(), ttl_s)
                }))
        } else {
            let by = self
                .backend
                .lock_record(&key)
                .await?
                .map(|r| r.owner)
                .unwrap_or_else(|| "unknown".to_string());
            Err(RoomError::FileLocked { resource: resource.to_string(), by })
        }
    }

    /// Release `resource` if held by `owner`.
    pub async fn release(&self, resource: &str, owner: &str) -> Result<(), RoomError> {
        validate_resource(resource)?;
        let key = format!("{LOCK_KEY_PREFIX}{resource}");

        match self.backend.lock_record(&key).await? {
            None => Err(RoomError::FileNotLocked { resource: resource.to_string() }),
            Some(record) if record.owner != owner => Err(RoomError::FileLocked {
                resource: resource.to_string(),
                by: record.owner,
            }),
            Some(_) => {
                self.backend.release_lock(&key, owner).await?;
                Ok(())
            }
        }
    }

    /// Live locks, with user-facing resource names.
    pub async fn list(&self) -> Result<Vec<ResourceLock>, RoomError> {
        let records = self.backend.lock_records().await?;
        Ok(records.into_iter().map(strip_prefix).collect())
    }
}

fn strip_prefix(mut record: ResourceLock) -> ResourceLock {
    if let Some(resource) = record.resource.strip_prefix(LOCK_KEY_PREFIX) {
        record.resource = resource.to_string();
    }
    record
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
