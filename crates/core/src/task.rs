// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// A unit of shared work in the room backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Dense, non-reused `task-NNN` identifier.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 1 (highest) through 5 (lowest).
    pub priority: u8,
    #[serde(rename = "task_status")]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Optional Git worktree reference attached by external tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
}

/// Lifecycle state of a task, with per-state attribution payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    Claimed {
        assignee: String,
        claimed_at: DateTime<Utc>,
    },
    InProgress {
        assignee: String,
        started_at: DateTime<Utc>,
    },
    Done {
        assignee: String,
        completed_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Cancelled {
        cancelled_by: String,
        cancelled_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

crate::simple_display! {
    TaskStatus {
        Todo => "todo",
        Claimed{..} => "claimed",
        InProgress{..} => "in_progress",
        Done{..} => "done",
        Cancelled{..} => "cancelled",
    }
}

/// Tag-only variant of [`TaskStatus`] for listings and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusKind {
    Todo,
    Claimed,
    InProgress,
    Done,
    Cancelled,
}

impl From<&TaskStatus> for TaskStatusKind {
    fn from(s: &TaskStatus) -> Self {
        match s {
            TaskStatus::Todo => TaskStatusKind::Todo,
            TaskStatus::Claimed { .. } => TaskStatusKind::Claimed,
            TaskStatus::InProgress { .. } => TaskStatusKind::InProgress,
            TaskStatus::Done { .. } => TaskStatusKind::Done,
            TaskStatus::Cancelled { .. } => TaskStatusKind::Cancelled,
        }
    }
}

crate::simple_display! {
    TaskStatusKind {
        Todo => "todo",
        Claimed => "claimed",
        InProgress => "in_progress",
        Done => "done",
        Cancelled => "cancelled",
    }
}

/// An attempted transition against the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskAction {
    Claim,
    Start,
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Release,
    Cancel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

crate::simple_display! {
    TaskAction {
        Claim => "claim",
        Start => "start",
        Done{..} => "done",
        Release => "release",
        Cancel{..} => "cancel",
    }
}

impl TaskAction {
    /// Parse a wire action name, attaching the optional payload.
    pub fn parse(action: &str, notes: Option<String>, reason: Option<String>) -> Option<Self> {
        match action {
            "claim" => Some(TaskAction::Claim),
            "start" => Some(TaskAction::Start),
            "done" => Some(TaskAction::Done { notes }),
            "release" => Some(TaskAction::Release),
            "cancel" => Some(TaskAction::Cancel { reason }),
            _ => None,
        }
    }
}

impl TaskStatus {
    /// The agent currently responsible for the task, if any.
    pub fn assignee(&self) -> Option<&str> {
        match self {
            TaskStatus::Claimed { assignee, .. }
            | TaskStatus::InProgress { assignee, .. }
            | TaskStatus::Done { assignee, .. } => Some(assignee),
            TaskStatus::Todo | TaskStatus::Cancelled { .. } => None,
        }
    }

    /// Open tasks still count toward GC message retention and id mentions.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TaskStatus::Todo | TaskStatus::Claimed { .. } | TaskStatus::InProgress { .. }
        )
    }

    /// Evaluate `action` by `actor` against the transition table.
    ///
    /// `start`, `done`, `release`, and (for non-todo states) `cancel` require
    /// the actor to be the current assignee. All other combinations fail with
    /// a current-state → action summary.
    pub fn apply(
        &self,
        action: &TaskAction,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus, RoomError> {
        match (self, action) {
            (TaskStatus::Todo, TaskAction::Claim) => Ok(TaskStatus::Claimed {
                assignee: actor.to_string(),
                claimed_at: now,
            }),
            (TaskStatus::Claimed { assignee, .. }, TaskAction::Claim)
            | (TaskStatus::InProgress { assignee, .. }, TaskAction::Claim) => {
                Err(RoomError::TaskAlreadyClaimed { by: assignee.clone() })
            }

            (TaskStatus::Claimed { assignee, .. }, TaskAction::Start) => {
                self.require_assignee(assignee, actor, action)?;
                Ok(TaskStatus::InProgress { assignee: assignee.clone(), started_at: now })
            }

            (TaskStatus::Claimed { assignee, .. }, TaskAction::Release)
            | (TaskStatus::InProgress { assignee, .. }, TaskAction::Release) => {
                self.require_assignee(assignee, actor, action)?;
                Ok(TaskStatus::Todo)
            }
            (TaskStatus::Todo, TaskAction::Release) => Err(RoomError::TaskNotClaimed),

            (TaskStatus::Claimed { assignee, .. }, TaskAction::Done { notes })
            | (TaskStatus::InProgress { assignee, .. }, TaskAction::Done { notes }) => {
                self.require_assignee(assignee, actor, action)?;
                Ok(TaskStatus::Done {
                    assignee: assignee.clone(),
                    completed_at: now,
                    notes: notes.clone(),
                })
            }

            (TaskStatus::Todo, TaskAction::Cancel { reason }) => Ok(TaskStatus::Cancelled {
                cancelled_by: actor.to_string(),
                cancelled_at: now,
                reason: reason.clone(),
            }),
            (TaskStatus::Claimed { assignee, .. }, TaskAction::Cancel { reason })
            | (TaskStatus::InProgress { assignee, .. }, TaskAction::Cancel { reason }) => {
                self.require_assignee(assignee, actor, action)?;
                Ok(TaskStatus::Cancelled {
                    cancelled_by: actor.to_string(),
                    cancelled_at: now,
                    reason: reason.clone(),
                })
            }

            _ => Err(RoomError::TaskInvalidState(format!(
                "cannot {action} a {self} task"
            ))),
        }
    }

    fn require_assignee(
        &self,
        assignee: &str,
        actor: &str,
        action: &TaskAction,
    ) -> Result<(), RoomError> {
        if assignee == actor {
            Ok(())
        } else {
            Err(RoomError::TaskInvalidState(format!(
                "{self} task is assigned to {assignee}; only the assignee can {action}"
            )))
        }
    }
}

/// Starvation-mitigated priority: nominal priority minus one level per full
/// day of age, floored at 1.
pub fn effective_priority(priority: u8, created_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    let age_hours = (now - created_at).num_hours().max(0) as u64;
    let boost = (age_hours / 24) as u8;
    priority.saturating_sub(boost).max(1)
}

/// Parse the numeric suffix of a `task-NNN` id.
pub fn task_number(id: &str) -> Option<u64> {
    id.strip_prefix("task-")?.parse().ok()
}

/// Format a dense task id (`task-001`, zero-padded to three digits).
pub fn format_task_id(n: u64) -> String {
    format!("task-{n:03}")
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into { id: String = "task-001", title: String = "test task", description: String = "" }
        set { priority: u8 = 3, status: TaskStatus = TaskStatus::Todo }
        option { worktree: String = None }
        computed { created_at: DateTime<Utc> = Utc::now() }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
