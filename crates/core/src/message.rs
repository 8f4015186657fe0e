// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room messages and content sanitization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum persisted message content length in characters.
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Origin class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Agent-authored fan-out to every mailbox.
    Broadcast,
    /// Addressed to a single agent via `mention`.
    Direct,
    /// Emitted by the engine for auto events (claims, GC, pauses).
    System,
}

crate::simple_display! {
    MessageKind {
        Broadcast => "broadcast",
        Direct => "direct",
        System => "system",
    }
}

/// One persisted room message (`messages/<seq>_<agent>_broadcast.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Assigned from the room's `message_seq`: monotonic and gap-free.
    pub seq: u64,
    pub from_agent: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        seq: u64,
        from_agent: impl Into<String>,
        kind: MessageKind,
        content: &str,
        mention: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            seq,
            from_agent: from_agent.into(),
            kind,
            content: sanitize_content(content),
            mention,
            timestamp,
        }
    }
}

/// Strip control characters (newline and tab survive) and clamp to
/// [`MAX_MESSAGE_LEN`] characters.
pub fn sanitize_content(content: &str) -> String {
    content
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_MESSAGE_LEN)
        .collect()
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
