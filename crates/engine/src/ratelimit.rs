// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent token buckets with role multipliers.

use chrono::{DateTime, Utc};

/// Throttled operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    General,
    Broadcast,
    TaskOps,
    FileLock,
}

impl RateCategory {
    /// (sustained tokens per second, burst pool size)
    fn limits(self) -> (f64, f64) {
        match self {
            RateCategory::General => (1.0, 10.0),
            RateCategory::Broadcast => (0.2, 3.0),
            RateCategory::TaskOps => (0.5, 5.0),
            RateCategory::FileLock => (0.5, 5.0),
        }
    }
}

/// Agent role; higher roles get proportionally larger budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    Worker,
    Admin,
}

impl Role {
    fn multiplier(self) -> f64 {
        match self {
            Role::Reader => 0.5,
            Role::Worker => 1.0,
            Role::Admin => 2.0,
        }
    }
}

/// Outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Seconds until a token will be available (0 when allowed).
    pub wait_s: f64,
}

/// One category's token bucket.
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

impl Bucket {
    pub(crate) fn new(category: RateCategory, role: Role, now: DateTime<Utc>) -> Self {
        let (_, burst) = category.limits();
        Self { tokens: burst * role.multiplier(), last_refill: now }
    }

    /// Refill by elapsed time, then try to take one token.
    pub(crate) fn check(
        &mut self,
        category: RateCategory,
        role: Role,
        now: DateTime<Utc>,
    ) -> RateDecision {
        let (rate, burst) = category.limits();
        let rate = rate * role.multiplier();
        let capacity = burst * role.multiplier();

        let elapsed = (now - self.last_refill).num_milliseconds().max(0) as f64 / 1000.0;
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateDecision { allowed: true, wait_s: 0.0 }
        } else {
            RateDecision { allowed: false, wait_s: (1.0 - self.tokens) / rate }
        }
    }
}

#[cfg(test)]
#[path = "ratelimit_tests.rs"]
mod tests;
