// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task engine: the backlog state machine under concurrent tool calls.
//!
//! Every mutation follows one discipline: take the backlog-level advisory
//! lock, load, optionally verify the caller's `expected_version` (CAS),
//! evaluate the transition, bump the version, persist atomically, mirror
//! the assignee into the agent record, release. The lock guard is RAII, so
//! it releases on every exit path.

use chrono::{DateTime, Utc};
use tracing::debug;

use masc_core::{
    effective_priority, validate_priority, validate_task_id, Clock, RoomError, Task, TaskAction,
    TaskStatus, TaskStatusKind,
};
use masc_store::RoomStore;

/// Input for one task in a (batch) add.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: i64,
    pub worktree: Option<String>,
}

/// Result of a successful transition, with everything callers need to
/// format responses and emit events.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub task: Task,
    pub previous: TaskStatusKind,
    pub version: u64,
}

impl TransitionOutcome {
    /// Human summary in the `task-001 todo → claimed` shape.
    pub fn summary(&self) -> String {
        format!(
            "{} {} → {}",
            self.task.id,
            self.previous,
            TaskStatusKind::from(&self.task.status)
        )
    }
}

/// Serialized mutations over the backlog document.
pub struct TaskEngine<C: Clock> {
    store: RoomStore,
    clock: C,
}

impl<C: Clock> TaskEngine<C> {
    pub fn new(store: RoomStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Add one task; returns it with the new backlog version.
    pub fn add_task(&self, spec: NewTask) -> Result<(Task, u64), RoomError> {
        let (mut tasks, version) = self.add_tasks(vec![spec])?;
        match tasks.pop() {
            Some(task) => Ok((task, version)),
            None => Err(RoomError::Validation("no task provided".to_string())),
        }
    }

    /// Add a batch in one locked transaction with contiguous ids. Any
    /// validation failure rejects the whole batch before anything persists.
    pub fn add_tasks(&self, specs: Vec<NewTask>) -> Result<(Vec<Task>, u64), RoomError> {
        if specs.is_empty() {
            return Err(RoomError::Validation("no tasks provided".to_string()));
        }
        for spec in &specs {
            if spec.title.trim().is_empty() {
                return Err(RoomError::Validation("task title must not be empty".to_string()));
            }
            validate_priority(spec.priority)?;
        }

        let _guard = self.store.lock_backlog()?;
        let mut backlog = self.store.load_backlog()?;
        let archive = self.store.load_archive()?;
        let now = self.clock.now();

        let mut added = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = backlog.next_task_id(archive.tasks.iter().map(|t| t.id.as_str()));
            let task = Task {
                id,
                title: spec.title,
                description: spec.description,
                priority: spec.priority as u8,
                status: TaskStatus::Todo,
                created_at: now,
                worktree: spec.worktree,
            };
            backlog.tasks.push(task.clone());
            added.push(task);
        }
        backlog.commit(now);
        self.store.save_backlog(&backlog)?;
        debug!(count = added.len(), version = backlog.version, "tasks added");
        Ok((added, backlog.version))
    }

    /// Current backlog snapshot.
    pub fn list(&self) -> Result<masc_core::Backlog, RoomError> {
        self.store.load_backlog()
    }

    /// Apply `action` by `actor` to `task_id`, optionally guarded by a CAS
    /// on the backlog version.
    pub fn transition(
        &self,
        task_id: &str,
        action: &TaskAction,
        actor: &str,
        expected_version: Option<u64>,
    ) -> Result<TransitionOutcome, RoomError> {
        validate_task_id(task_id)?;

        let _guard = self.store.lock_backlog()?;
        let mut backlog = self.store.load_backlog()?;

        if let Some(expected) = expected_version {
            if backlog.version != expected {
                return Err(RoomError::version_mismatch(expected, backlog.version));
            }
        }

        let now = self.clock.now();
        let task = backlog
            .find(task_id)
            .ok_or_else(|| RoomError::TaskNotFound(task_id.to_string()))?;
        let previous = TaskStatusKind::from(&task.status);
        let next = task.status.apply(action, actor, now)?;

        let previous_assignee = task.status.assignee().map(str::to_string);
        if let Some(task) = backlog.find_mut(task_id) {
            task.status = next;
        }
        backlog.commit(now);
        self.store.save_backlog(&backlog)?;

        let task = backlog
            .find(task_id)
            .cloned()
            .ok_or_else(|| RoomError::TaskNotFound(task_id.to_string()))?;
        self.mirror_assignee(&task, previous_assignee.as_deref(), now);

        debug!(task = task_id, %action, version = backlog.version, "transition applied");
        Ok(TransitionOutcome { task, previous, version: backlog.version })
    }

    /// Claim the best unclaimed task for `actor`: sort todo tasks by
    /// (effective priority, created_at) and claim the first. Returns `None`
    /// (version untouched) when nothing is unclaimed.
    pub fn claim_next(&self, actor: &str) -> Result<Option<TransitionOutcome>, RoomError> {
        let candidate = {
            let backlog = self.store.load_backlog()?;
            let now = self.clock.now();
            let mut todos: Vec<&Task> = backlog
                .tasks
                .iter()
                .filter(|t| matches!(t.status, TaskStatus::Todo))
                .collect();
            todos.sort_by_key(|t| (effective_priority(t.priority, t.created_at, now), t.created_at));
            todos.first().map(|t| t.id.clone())
        };

        match candidate {
            // Between the peek and the claim another agent may win the
            // race; the claim itself re-checks under the backlog lock.
            Some(id) => match self.transition(&id, &TaskAction::Claim, actor, None) {
                Ok(outcome) => Ok(Some(outcome)),
                Err(RoomError::TaskAlreadyClaimed { .. }) => self.claim_next(actor),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    /// Move tasks created before `cutoff` that are not done into the
    /// archive. Archived ids keep counting toward new task numbers.
    pub fn archive_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>, RoomError> {
        let _guard = self.store.lock_backlog()?;
        let mut backlog = self.store.load_backlog()?;
        let now = self.clock.now();

        let (stale, live): (Vec<Task>, Vec<Task>) = backlog
            .tasks
            .drain(..)
            .partition(|t| t.created_at < cutoff && !matches!(t.status, TaskStatus::Done { .. }));

        if stale.is_empty() {
            backlog.tasks = live;
            return Ok(Vec::new());
        }

        backlog.tasks = live;
        backlog.commit(now);
        self.store.append_archive(stale.clone())?;
        self.store.save_backlog(&backlog)?;
        Ok(stale)
    }

    /// Mirror an assignee change into the agent record: set/clear
    /// `current_task` and flip status between busy and active. Missing
    /// records (e.g. a departed agent's task being released by GC) are
    /// skipped.
    fn mirror_assignee(&self, task: &Task, previous_assignee: Option<&str>, now: DateTime<Utc>) {
        use masc_core::AgentStatus;

        if let Some(assignee) = task.status.assignee() {
            if matches!(task.status, TaskStatus::Claimed { .. } | TaskStatus::InProgress { .. }) {
                let _ = self.store.update_agent(assignee, |agent| {
                    agent.current_task = Some(task.id.clone());
                    agent.status = AgentStatus::Busy;
                    agent.touch(now);
                    Ok(())
                });
                let _ = self.store.write_current_task(Some(&task.id));
                return;
            }
        }
        if self.store.read_current_task().ok().flatten().as_deref() == Some(task.id.as_str()) {
            let _ = self.store.write_current_task(None);
        }
        if let Some(previous) = previous_assignee {
            let _ = self.store.update_agent(previous, |agent| {
                if agent.current_task.as_deref() == Some(task.id.as_str()) {
                    agent.current_task = None;
                    agent.status = AgentStatus::Active;
                }
                agent.touch(now);
                Ok(())
            });
        }
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
