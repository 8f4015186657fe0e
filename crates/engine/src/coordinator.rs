// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-room coordinator owning the store, registries, and event bus.
//!
//! One coordinator value per room, injected into handlers; tests
//! instantiate a fresh one over a temp directory. Nothing is global.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use masc_core::{
    generate_nickname, validate_agent_name, AgentRecord, AgentStatus, Clock, Message, MessageKind,
    RoomError, RoomState, SystemClock, TaskAction,
};
use masc_store::{FsBackend, RoomStore, StorageBackend};

use crate::events::EventBus;
use crate::locks::LockManager;
use crate::planning::PlanningStore;
use crate::sessions::SessionRegistry;
use crate::sse::SseHub;
use crate::tasks::{NewTask, TaskEngine, TransitionOutcome};

/// Room-level knobs.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Append audit lines (governance switch).
    pub audit: bool,
    /// Liveness threshold for zombie classification.
    pub zombie_threshold: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { audit: true, zombie_threshold: Duration::minutes(5) }
    }
}

/// Presence row for `who` listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentStatusEntry {
    pub name: String,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub is_zombie: bool,
}

/// Parameters for a `join`.
#[derive(Debug, Clone, Default)]
pub struct JoinRequest {
    /// Explicit nickname; generated from `agent_type` when absent.
    pub name: Option<String>,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    pub session_id: Option<String>,
    pub pid: Option<u32>,
    pub hostname: Option<String>,
    pub tty: Option<String>,
    pub worktree: Option<String>,
    pub parent_task: Option<String>,
}

pub struct Coordinator<C: Clock = SystemClock> {
    store: RoomStore,
    backend: Arc<dyn StorageBackend>,
    clock: C,
    config: RoomConfig,
    pub tasks: TaskEngine<C>,
    pub sessions: SessionRegistry<C>,
    pub locks: LockManager,
    pub planning: PlanningStore<C>,
    pub events: EventBus<C>,
    pub sse: Arc<SseHub>,
}

impl Coordinator<SystemClock> {
    /// Coordinator over the filesystem backend rooted at `base`.
    pub fn new(base: impl Into<std::path::PathBuf>, config: RoomConfig) -> Self {
        Self::with_clock(base, config, SystemClock)
    }
}

impl<C: Clock + 'static> Coordinator<C> {
    pub fn with_clock(
        base: impl Into<std::path::PathBuf>,
        config: RoomConfig,
        clock: C,
    ) -> Self {
        let store = RoomStore::new(base);
        let backend: Arc<dyn StorageBackend> =
            Arc::new(FsBackend::with_clock(store.paths().masc_dir(), clock.clone()));
        Self::assemble(store, backend, config, clock)
    }

    /// Inject a non-default backend (e.g. a distributed key-value store).
    pub fn with_backend(
        base: impl Into<std::path::PathBuf>,
        backend: Arc<dyn StorageBackend>,
        config: RoomConfig,
        clock: C,
    ) -> Self {
        Self::assemble(RoomStore::new(base), backend, config, clock)
    }

    fn assemble(
        store: RoomStore,
        backend: Arc<dyn StorageBackend>,
        config: RoomConfig,
        clock: C,
    ) -> Self {
        let sse = Arc::new(SseHub::new());
        let events = EventBus::new(store.clone(), Arc::clone(&sse), config.audit, clock.clone());
        Self {
            tasks: TaskEngine::new(store.clone(), clock.clone()),
            sessions: SessionRegistry::new(clock.clone()),
            locks: LockManager::new(Arc::clone(&backend)),
            planning: PlanningStore::new(store.clone(), clock.clone()),
            events,
            sse,
            store,
            backend,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -- Room lifecycle -----------------------------------------------------

    /// Initialize the room; a second call is a no-op.
    pub fn init(&self, project: &str) -> Result<bool, RoomError> {
        let created = self.store.init(project, self.clock.now())?;
        if created {
            self.store.register_room(project, self.store.paths().base())?;
            self.store.write_current_room(project)?;
            info!(project, "room initialized");
        }
        self.events.emit("system", "init", true, Some(project.to_string()));
        Ok(created)
    }

    pub fn state(&self) -> Result<RoomState, RoomError> {
        self.store.load_state()
    }

    /// Reject room mutations while paused.
    fn ensure_unpaused(&self) -> Result<(), RoomError> {
        let state = self.store.load_state()?;
        match state.paused {
            Some(paused) => Err(RoomError::Validation(format!(
                "room is paused by {} ({})",
                paused.by,
                paused.reason.as_deref().unwrap_or("no reason given")
            ))),
            None => Ok(()),
        }
    }

    pub fn pause(&self, by: &str, reason: Option<String>) -> Result<(), RoomError> {
        let now = self.clock.now();
        self.store.update_state(|state| {
            state.paused =
                Some(masc_core::PausedInfo { by: by.to_string(), reason: reason.clone(), at: now });
            Ok(())
        })?;
        self.system_broadcast(&format!("room paused by {by}"))?;
        self.events.emit(by, "pause", true, reason);
        Ok(())
    }

    pub fn resume(&self, by: &str) -> Result<(), RoomError> {
        self.store.update_state(|state| {
            state.paused = None;
            Ok(())
        })?;
        self.system_broadcast(&format!("room resumed by {by}"))?;
        self.events.emit(by, "resume", true, None);
        Ok(())
    }

    // -- Presence -----------------------------------------------------------

    /// Join the room. A bare agent type gets a generated
    /// `<type>-<adjective>-<animal>` nickname (retried on collision);
    /// re-joining an existing nickname refreshes the record in place.
    pub fn join(&self, request: JoinRequest) -> Result<AgentRecord, RoomError> {
        let now = self.clock.now();
        let name = match &request.name {
            Some(name) => {
                validate_agent_name(name)?;
                name.clone()
            }
            None => {
                let agent_type =
                    if request.agent_type.is_empty() { "agent" } else { &request.agent_type };
                loop {
                    let candidate = generate_nickname(agent_type);
                    if self.store.load_agent(&candidate)?.is_none() {
                        break candidate;
                    }
                }
            }
        };

        let mut agent = match self.store.load_agent(&name)? {
            Some(mut existing) => {
                existing.status = AgentStatus::Active;
                existing.touch(now);
                existing
            }
            None => AgentRecord::new(name.clone(), request.agent_type.clone(), now),
        };
        agent.capabilities.extend(request.capabilities.iter().cloned());
        agent.session_id = request.session_id.or(agent.session_id);
        agent.pid = request.pid.or(agent.pid);
        agent.hostname = request.hostname.or(agent.hostname);
        agent.tty = request.tty.or(agent.tty);
        agent.worktree = request.worktree.or(agent.worktree);
        agent.parent_task = request.parent_task.or(agent.parent_task);
        self.store.save_agent(&agent)?;

        self.store.update_state(|state| {
            state.add_agent(&name);
            Ok(())
        })?;
        self.sessions.register(&name);
        self.events.emit(&name, "join", true, Some(agent.agent_type.clone()));
        self.system_broadcast(&format!("{name} joined the room"))?;
        Ok(agent)
    }

    /// Leave the room; `Ok(false)` when the agent was not joined.
    pub fn leave(&self, name: &str) -> Result<bool, RoomError> {
        if self.store.load_agent(name)?.is_none() {
            return Ok(false);
        }
        self.store.remove_agent(name)?;
        self.store.update_state(|state| {
            state.remove_agent(name);
            Ok(())
        })?;
        self.sessions.unregister(name);
        self.events.emit(name, "leave", true, None);
        self.system_broadcast(&format!("{name} left the room"))?;
        Ok(true)
    }

    pub fn is_joined(&self, name: &str) -> Result<bool, RoomError> {
        Ok(self.store.load_agent(name)?.is_some())
    }

    /// Explicit heartbeat.
    pub fn heartbeat(&self, name: &str) -> Result<(), RoomError> {
        let now = self.clock.now();
        self.store.update_agent(name, |agent| {
            agent.touch(now);
            Ok(())
        })
    }

    /// Auto-heartbeat on dispatch: refresh `last_seen` when a record exists.
    pub fn touch(&self, name: &str) {
        let now = self.clock.now();
        let _ = self.store.update_agent(name, |agent| {
            agent.touch(now);
            Ok(())
        });
    }

    /// Presence rows with zombie classification.
    pub fn who(&self) -> Result<Vec<AgentStatusEntry>, RoomError> {
        let now = self.clock.now();
        Ok(self
            .store
            .list_agents()?
            .into_iter()
            .map(|agent| {
                let status = if self.sessions.is_listening(&agent.name) {
                    AgentStatus::Listening
                } else {
                    agent.status
                };
                AgentStatusEntry {
                    is_zombie: agent.is_zombie(now, self.config.zombie_threshold),
                    name: agent.name,
                    status,
                    current_task: agent.current_task,
                    last_seen: agent.last_seen,
                }
            })
            .collect())
    }

    // -- Messaging ----------------------------------------------------------

    /// Persist and fan out a message. The sequence number is allocated
    /// under the state lock, so seqs are gap-free and totally ordered.
    pub fn post_message(
        &self,
        from: &str,
        kind: MessageKind,
        content: &str,
        mention: Option<String>,
    ) -> Result<Message, RoomError> {
        if let Some(target) = &mention {
            validate_agent_name(target)?;
        }
        let now = self.clock.now();
        let seq = self.store.update_state(|state| Ok(state.next_message_seq()))?;
        let message = Message::new(seq, from, kind, content, mention, now);
        self.store.append_message(&message)?;
        self.sessions.push_message(&message);
        if let Ok(payload) = serde_json::to_value(&message) {
            self.sse.broadcast("message", &payload);
        }
        Ok(message)
    }

    fn system_broadcast(&self, content: &str) -> Result<(), RoomError> {
        self.post_message("system", MessageKind::System, content, None)?;
        Ok(())
    }

    // -- Tasks --------------------------------------------------------------

    pub fn add_task(&self, spec: NewTask, actor: &str) -> Result<(masc_core::Task, u64), RoomError> {
        self.ensure_unpaused()?;
        let (task, version) = self.tasks.add_task(spec)?;
        self.events.emit(actor, "task_added", true, Some(task.id.clone()));
        Ok((task, version))
    }

    pub fn add_tasks(
        &self,
        specs: Vec<NewTask>,
        actor: &str,
    ) -> Result<(Vec<masc_core::Task>, u64), RoomError> {
        self.ensure_unpaused()?;
        let (tasks, version) = self.tasks.add_tasks(specs)?;
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        self.events.emit(actor, "tasks_added", true, Some(ids.join(",")));
        Ok((tasks, version))
    }

    /// Transition with audit + system broadcast on success.
    pub fn transition(
        &self,
        task_id: &str,
        action: &TaskAction,
        actor: &str,
        expected_version: Option<u64>,
    ) -> Result<TransitionOutcome, RoomError> {
        self.ensure_unpaused()?;
        let outcome = self.tasks.transition(task_id, action, actor, expected_version)?;
        self.events.emit(actor, "task_transition", true, Some(outcome.summary()));
        self.system_broadcast(&format!("{} by {actor}", outcome.summary()))?;
        Ok(outcome)
    }

    pub fn claim_next(&self, actor: &str) -> Result<Option<TransitionOutcome>, RoomError> {
        self.ensure_unpaused()?;
        let outcome = self.tasks.claim_next(actor)?;
        if let Some(outcome) = &outcome {
            self.events.emit(actor, "task_transition", true, Some(outcome.summary()));
            self.system_broadcast(&format!("{} by {actor}", outcome.summary()))?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
