// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory resource lock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// TTL advisory lock over a room resource, with owner attribution.
///
/// A record past `expires_at` is considered released on next observation;
/// nothing actively reaps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLock {
    pub resource: String,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ResourceLock {
    pub fn new(
        resource: impl Into<String>,
        owner: impl Into<String>,
        now: DateTime<Utc>,
        ttl_s: u64,
    ) -> Self {
        Self {
            resource: resource.into(),
            owner: owner.into(),
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_s as i64),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
