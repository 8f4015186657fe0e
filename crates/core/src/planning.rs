// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task planning context carried across agent boundaries.
//!
//! `context.json` is canonical; the markdown siblings (`task_plan.md`,
//! `notes.md`, `errors.md`, `deliverable.md`) are derived views rebuilt
//! from it after every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// An error logged against a task while working on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub resolved: bool,
}

/// Canonical planning state for one task (`planning/<task_id>/context.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    pub task_id: String,
    #[serde(default)]
    pub task_plan: String,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub deliverable: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanningContext {
    pub fn new(task_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            task_plan: String::new(),
            notes: Vec::new(),
            errors: Vec::new(),
            deliverable: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_note(&mut self, note: impl Into<String>, now: DateTime<Utc>) {
        self.notes.push(note.into());
        self.updated_at = now;
    }

    pub fn log_error(&mut self, entry: ErrorEntry, now: DateTime<Utc>) {
        self.errors.push(entry);
        self.updated_at = now;
    }

    /// Flip `resolved` on the error at `index` (zero-based, append order).
    pub fn resolve_error(&mut self, index: usize, now: DateTime<Utc>) -> Result<(), RoomError> {
        match self.errors.get_mut(index) {
            Some(entry) => {
                entry.resolved = true;
                self.updated_at = now;
                Ok(())
            }
            None => Err(RoomError::Validation(format!(
                "error index {index} out of range ({} logged)",
                self.errors.len()
            ))),
        }
    }

    /// Render the derived `notes.md` view.
    pub fn notes_markdown(&self) -> String {
        let mut out = format!("# Notes — {}\n\n", self.task_id);
        for note in &self.notes {
            out.push_str("- ");
            out.push_str(note);
            out.push('\n');
        }
        out
    }

    /// Render the derived `errors.md` view.
    pub fn errors_markdown(&self) -> String {
        let mut out = format!("# Errors — {}\n\n", self.task_id);
        for (i, e) in self.errors.iter().enumerate() {
            let mark = if e.resolved { "x" } else { " " };
            out.push_str(&format!(
                "- [{mark}] {i}. [{}] {}: {}\n",
                e.timestamp.to_rfc3339(),
                e.kind,
                e.message
            ));
        }
        out
    }
}

#[cfg(test)]
#[path = "planning_tests.rs"]
mod tests;
