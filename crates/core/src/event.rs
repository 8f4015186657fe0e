// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One JSON line in `audit.log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub event_type: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(
        now: DateTime<Utc>,
        agent: impl Into<String>,
        event_type: impl Into<String>,
        success: bool,
        detail: Option<String>,
    ) -> Self {
        Self { timestamp: now, agent: agent.into(), event_type: event_type.into(), success, detail }
    }
}
