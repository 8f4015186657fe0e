// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room state and backlog documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{format_task_id, task_number, Task};

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Who paused the room, why, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausedInfo {
    pub by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// The room's single versioned state document (`state.json`).
///
/// `message_seq` never decreases; it is the allocator for message
/// sequence numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    pub protocol_version: String,
    pub project: String,
    #[serde(default)]
    pub message_seq: u64,
    #[serde(default)]
    pub active_agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<PausedInfo>,
}

impl RoomState {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            project: project.into(),
            message_seq: 0,
            active_agents: Vec::new(),
            paused: None,
        }
    }

    /// Allocate the next message sequence number (monotonic, gap-free).
    pub fn next_message_seq(&mut self) -> u64 {
        self.message_seq += 1;
        self.message_seq
    }

    /// Add a nickname to the active set; idempotent.
    pub fn add_agent(&mut self, name: &str) {
        if !self.active_agents.iter().any(|a| a == name) {
            self.active_agents.push(name.to_string());
        }
    }

    /// Remove a nickname from the active set; idempotent.
    pub fn remove_agent(&mut self, name: &str) {
        self.active_agents.retain(|a| a != name);
    }
}

/// The ordered task backlog (`backlog.json`).
///
/// `version` is strictly monotonic: every mutation increments it by one,
/// making it the witness consumed by compare-and-set transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlog {
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Backlog {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { tasks: Vec::new(), last_updated: now, version: 0 }
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Record a mutation: bump the version and stamp `last_updated`.
    pub fn commit(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.last_updated = now;
    }

    /// Next dense task id, counting both live and archived ids so a number
    /// is never reused after archival.
    pub fn next_task_id<'a>(&self, archive_ids: impl Iterator<Item = &'a str>) -> String {
        let live = self.tasks.iter().filter_map(|t| task_number(&t.id));
        let archived = archive_ids.filter_map(task_number);
        let max = live.chain(archived).max().unwrap_or(0);
        format_task_id(max + 1)
    }
}

/// Machine-wide registry of known rooms (`rooms.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRegistry {
    #[serde(default)]
    pub rooms: std::collections::BTreeMap<String, std::path::PathBuf>,
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;
