// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed readers and writers for room documents.
//!
//! Mutating helpers (`update_*`) hold the target's advisory lock across the
//! read-modify-write window and persist with an atomic rewrite, so a crash
//! never leaves a half-written document and concurrent writers serialize.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use masc_core::{AgentRecord, AuditEvent, Backlog, Message, RoomError, RoomRegistry, RoomState, Task};

use crate::files::{append_line, read_json, with_file_lock, write_json_atomic, FileLock};
use crate::paths::RoomPaths;

/// Archived tasks moved out of the backlog (`tasks-archive.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskArchive {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// File-backed store for one room.
#[derive(Debug, Clone)]
pub struct RoomStore {
    paths: RoomPaths,
}

impl RoomStore {
    pub fn new(base: impl Into<std::path::PathBuf>) -> Self {
        Self { paths: RoomPaths::new(base) }
    }

    pub fn paths(&self) -> &RoomPaths {
        &self.paths
    }

    /// A room exists once its state file does.
    pub fn is_initialized(&self) -> bool {
        self.paths.state().exists()
    }

    /// Create the room layout and state/backlog documents. Idempotent: an
    /// already-initialized room is left untouched.
    pub fn init(&self, project: &str, now: DateTime<Utc>) -> Result<bool, RoomError> {
        let state_path = self.paths.state();
        with_file_lock(&state_path, || {
            if state_path.exists() {
                return Ok(false);
            }
            for dir in [
                self.paths.masc_dir(),
                self.paths.agents_dir(),
                self.paths.messages_dir(),
                self.paths.sessions_dir(),
                self.paths.cache_dir(),
            ] {
                std::fs::create_dir_all(dir)?;
            }
            write_json_atomic(&state_path, &RoomState::new(project))?;
            write_json_atomic(&self.paths.backlog(), &Backlog::new(now))?;
            Ok(true)
        })
    }

    // -- State --------------------------------------------------------------

    pub fn load_state(&self) -> Result<RoomState, RoomError> {
        read_json(&self.paths.state())?.ok_or(RoomError::NotInitialized)
    }

    /// Locked read-modify-write on the state document.
    pub fn update_state<T>(
        &self,
        f: impl FnOnce(&mut RoomState) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let path = self.paths.state();
        with_file_lock(&path, || {
            let mut state: RoomState = read_json(&path)?.ok_or(RoomError::NotInitialized)?;
            let out = f(&mut state)?;
            write_json_atomic(&path, &state)?;
            Ok(out)
        })
    }

    // -- Backlog ------------------------------------------------------------

    pub fn load_backlog(&self) -> Result<Backlog, RoomError> {
        read_json(&self.paths.backlog())?.ok_or(RoomError::NotInitialized)
    }

    /// Acquire the backlog-level lock for a multi-step transaction.
    /// The guard releases on drop, including on error and panic paths.
    pub fn lock_backlog(&self) -> Result<FileLock, RoomError> {
        FileLock::acquire(&self.paths.backlog())
    }

    /// Persist the backlog. Callers must hold the guard from
    /// [`Self::lock_backlog`] across their read-modify-write.
    pub fn save_backlog(&self, backlog: &Backlog) -> Result<(), RoomError> {
        write_json_atomic(&self.paths.backlog(), backlog)
    }

    // -- Archive ------------------------------------------------------------

    pub fn load_archive(&self) -> Result<TaskArchive, RoomError> {
        Ok(read_json(&self.paths.archive())?.unwrap_or_default())
    }

    pub fn append_archive(&self, tasks: Vec<Task>) -> Result<(), RoomError> {
        let path = self.paths.archive();
        with_file_lock(&path, || {
            let mut archive: TaskArchive = read_json(&path)?.unwrap_or_default();
            archive.tasks.extend(tasks);
            write_json_atomic(&path, &archive)
        })
    }

    // -- Agents -------------------------------------------------------------

    pub fn load_agent(&self, name: &str) -> Result<Option<AgentRecord>, RoomError> {
        read_json(&self.paths.agent(name))
    }

    pub fn save_agent(&self, agent: &AgentRecord) -> Result<(), RoomError> {
        let path = self.paths.agent(&agent.name);
        with_file_lock(&path, || write_json_atomic(&path, agent))
    }

    /// Locked read-modify-write on one agent record.
    pub fn update_agent<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut AgentRecord) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let path = self.paths.agent(name);
        with_file_lock(&path, || {
            let mut agent: AgentRecord =
                read_json(&path)?.ok_or_else(|| RoomError::AgentNotFound(name.to_string()))?;
            let out = f(&mut agent)?;
            write_json_atomic(&path, &agent)?;
            Ok(out)
        })
    }

    pub fn remove_agent(&self, name: &str) -> Result<bool, RoomError> {
        let path = self.paths.agent(name);
        with_file_lock(&path, || match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        })
    }

    pub fn list_agents(&self) -> Result<Vec<AgentRecord>, RoomError> {
        let mut agents: Vec<AgentRecord> = self
            .read_dir_json(&self.paths.agents_dir())?
            .into_iter()
            .collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }

    // -- Messages -----------------------------------------------------------

    pub fn append_message(&self, message: &Message) -> Result<(), RoomError> {
        let path = self.paths.message(message.seq, &message.from_agent);
        write_json_atomic(&path, message)
    }

    /// Messages with `seq > since_seq`, most recent first, at most `limit`.
    pub fn list_messages(&self, since_seq: u64, limit: usize) -> Result<Vec<Message>, RoomError> {
        let mut messages: Vec<Message> = self
            .read_dir_json(&self.paths.messages_dir())?
            .into_iter()
            .filter(|m: &Message| m.seq > since_seq)
            .collect();
        messages.sort_by(|a, b| b.seq.cmp(&a.seq));
        messages.truncate(limit);
        Ok(messages)
    }

    /// Drop persisted messages failing `keep`; returns how many were removed.
    pub fn prune_messages(
        &self,
        keep: impl Fn(&Message) -> bool,
    ) -> Result<usize, RoomError> {
        let dir = self.paths.messages_dir();
        let mut removed = 0;
        for (path, message) in self.read_dir_json_with_paths::<Message>(&dir)? {
            if !keep(&message) {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    // -- Audit log ----------------------------------------------------------

    pub fn append_audit(&self, event: &AuditEvent) -> Result<(), RoomError> {
        let path = self.paths.audit_log();
        let line = serde_json::to_string(event)?;
        with_file_lock(&path, || append_line(&path, &line))
    }

    /// Most recent audit events, newest first, at most `limit`.
    pub fn read_audit(&self, limit: usize) -> Result<Vec<AuditEvent>, RoomError> {
        let path = self.paths.audit_log();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut events: Vec<AuditEvent> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }

    // -- Pointer files ------------------------------------------------------

    /// `current_task` pointer: the task most recently claimed in this room.
    pub fn write_current_task(&self, task_id: Option<&str>) -> Result<(), RoomError> {
        let path = self.paths.current_task();
        match task_id {
            Some(task_id) => std::fs::write(&path, task_id)?,
            None => {
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn read_current_task(&self) -> Result<Option<String>, RoomError> {
        read_pointer(&self.paths.current_task())
    }

    /// `current_room` pointer: the project name this room was initialized as.
    pub fn write_current_room(&self, project: &str) -> Result<(), RoomError> {
        std::fs::write(self.paths.current_room(), project)?;
        Ok(())
    }

    pub fn read_current_room(&self) -> Result<Option<String>, RoomError> {
        read_pointer(&self.paths.current_room())
    }

    // -- Session identity ---------------------------------------------------

    pub fn read_session_identity(&self, session_id: &str) -> Result<Option<String>, RoomError> {
        let path = self.paths.session_identity(session_id);
        match std::fs::read_to_string(&path) {
            Ok(name) => {
                let name = name.trim().to_string();
                Ok((!name.is_empty()).then_some(name))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_session_identity(&self, session_id: &str, name: &str) -> Result<(), RoomError> {
        let path = self.paths.session_identity(session_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, name)?;
        Ok(())
    }

    // -- Room registry ------------------------------------------------------

    pub fn load_registry(&self) -> Result<RoomRegistry, RoomError> {
        Ok(read_json(&self.paths.rooms_registry())?.unwrap_or_default())
    }

    pub fn register_room(&self, name: &str, base: &Path) -> Result<(), RoomError> {
        let path = self.paths.rooms_registry();
        with_file_lock(&path, || {
            let mut registry: RoomRegistry = read_json(&path)?.unwrap_or_default();
            registry.rooms.insert(name.to_string(), base.to_path_buf());
            write_json_atomic(&path, &registry)
        })
    }

    // -- Helpers ------------------------------------------------------------

    fn read_dir_json<T: serde::de::DeserializeOwned>(
        &self,
        dir: &Path,
    ) -> Result<Vec<T>, RoomError> {
        Ok(self.read_dir_json_with_paths(dir)?.into_iter().map(|(_, v)| v).collect())
    }

    fn read_dir_json_with_paths<T: serde::de::DeserializeOwned>(
        &self,
        dir: &Path,
    ) -> Result<Vec<(std::path::PathBuf, T)>, RoomError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            // Skip documents that fail to parse rather than poisoning the
            // whole listing; they are surfaced by direct reads.
            if let Some(value) = read_json(&path).ok().flatten() {
                out.push((path, value));
            }
        }
        Ok(out)
    }
}

fn read_pointer(path: &Path) -> Result<Option<String>, RoomError> {
    match std::fs::read_to_string(path) {
        Ok(value) => {
            let value = value.trim().to_string();
            Ok((!value.is_empty()).then_some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;
