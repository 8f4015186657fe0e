// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical path computation for a room's on-disk layout.
//!
//! ```text
//! <base>/.masc/state.json
//! <base>/.masc/backlog.json
//! <base>/.masc/tasks-archive.json
//! <base>/.masc/agents/<nickname>.json
//! <base>/.masc/messages/<seq>_<agent>_broadcast.json
//! <base>/.masc/audit.log
//! <base>/.masc/current_task, current_room, rooms.json
//! <base>/.masc/sessions/<session_id>
//! <base>/.masc/cache/<key>.json
//! <base>/planning/<task_id>/{task_plan,notes,errors,deliverable}.md + context.json
//! ```

use std::path::{Path, PathBuf};

use masc_core::{validate_resource, RoomError};

/// Path computation rooted at a room base directory.
#[derive(Debug, Clone)]
pub struct RoomPaths {
    base: PathBuf,
}

impl RoomPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn masc_dir(&self) -> PathBuf {
        self.base.join(".masc")
    }

    pub fn state(&self) -> PathBuf {
        self.masc_dir().join("state.json")
    }

    pub fn backlog(&self) -> PathBuf {
        self.masc_dir().join("backlog.json")
    }

    pub fn archive(&self) -> PathBuf {
        self.masc_dir().join("tasks-archive.json")
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.masc_dir().join("agents")
    }

    pub fn agent(&self, name: &str) -> PathBuf {
        self.agents_dir().join(format!("{name}.json"))
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.masc_dir().join("messages")
    }

    /// Zero-padded seq keeps lexical order equal to numeric order.
    pub fn message(&self, seq: u64, from_agent: &str) -> PathBuf {
        self.messages_dir().join(format!("{seq:06}_{from_agent}_broadcast.json"))
    }

    pub fn audit_log(&self) -> PathBuf {
        self.masc_dir().join("audit.log")
    }

    pub fn rooms_registry(&self) -> PathBuf {
        self.masc_dir().join("rooms.json")
    }

    pub fn current_task(&self) -> PathBuf {
        self.masc_dir().join("current_task")
    }

    pub fn current_room(&self) -> PathBuf {
        self.masc_dir().join("current_room")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.masc_dir().join("sessions")
    }

    pub fn session_identity(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(encode_key(session_id))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.masc_dir().join("cache")
    }

    pub fn cache_entry(&self, key: &str) -> PathBuf {
        self.cache_dir().join(format!("{}.json", encode_key(key)))
    }

    pub fn planning_dir(&self, task_id: &str) -> PathBuf {
        self.base.join("planning").join(task_id)
    }

    pub fn planning_context(&self, task_id: &str) -> PathBuf {
        self.planning_dir(task_id).join("context.json")
    }

    /// Validate a caller-supplied relative path and join it under the base.
    pub fn join_validated(&self, relative: &str) -> Result<PathBuf, RoomError> {
        validate_resource(relative)?;
        Ok(self.base.join(relative))
    }
}

/// Encode an arbitrary key into a single safe file name component.
/// Every byte outside `[A-Za-z0-9._-]` becomes `%XX`.
pub fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
