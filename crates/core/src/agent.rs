// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent presence records and nickname generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Presence status of an agent in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Joined and available for work.
    Active,
    /// Working on a claimed task.
    Busy,
    /// Blocked inside `wait_for_message`.
    Listening,
    /// Left or timed out.
    Inactive,
}

crate::simple_display! {
    AgentStatus {
        Active => "active",
        Busy => "busy",
        Listening => "listening",
        Inactive => "inactive",
    }
}

/// Persisted record for one agent (`agents/<nickname>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    pub agent_type: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<String>,
}

impl AgentRecord {
    /// Fresh record for a newly joined agent.
    pub fn new(name: impl Into<String>, agent_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            agent_type: agent_type.into(),
            status: AgentStatus::Active,
            capabilities: BTreeSet::new(),
            current_task: None,
            joined_at: now,
            last_seen: now,
            session_id: None,
            pid: None,
            hostname: None,
            tty: None,
            worktree: None,
            parent_task: None,
        }
    }

    /// An agent whose `last_seen` exceeds the liveness threshold is a zombie.
    pub fn is_zombie(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.last_seen > threshold
    }

    /// Record activity. `last_seen` is non-decreasing: a stale clock reading
    /// never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }
}

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "calm", "clever", "deft", "eager", "fleet", "gentle", "keen",
    "lively", "lucid", "merry", "nimble", "plucky", "quick", "quiet", "sly", "steady", "stern",
    "sunny", "swift", "tidy", "wry",
];

const ANIMALS: &[&str] = &[
    "badger", "bee", "crane", "crow", "deer", "fox", "hare", "heron", "ibex", "jay", "koala",
    "lemur", "lynx", "mole", "newt", "otter", "owl", "panda", "raven", "seal", "stoat", "tern",
    "vole", "wren",
];

/// Generate a `<type>-<adjective>-<animal>` nickname from a bare agent type.
pub fn generate_nickname(agent_type: &str) -> String {
    use rand::prelude::IndexedRandom;
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).unwrap_or(&"swift");
    let animal = ANIMALS.choose(&mut rng).unwrap_or(&"otter");
    format!("{agent_type}-{adjective}-{animal}")
}

/// Generate a fallback identity for a session that never joined explicitly.
pub fn generate_anonymous_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("agent-{}", &id[..8])
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
