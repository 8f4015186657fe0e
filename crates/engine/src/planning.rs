// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task planning artifacts under `<base>/planning/<task_id>/`.
//!
//! `context.json` is canonical and every mutation happens under its
//! exclusive lock; the markdown siblings are regenerated views. A missing
//! or deleted sibling is rebuilt on the next read.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use masc_core::{validate_task_id, Clock, ErrorEntry, PlanningContext, RoomError};
use masc_store::{read_json, with_file_lock, write_json_atomic, RoomStore};

pub struct PlanningStore<C: Clock> {
    store: RoomStore,
    clock: C,
}

impl<C: Clock> PlanningStore<C> {
    pub fn new(store: RoomStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Replace the task plan.
    pub fn set_plan(&self, task_id: &str, plan: &str) -> Result<PlanningContext, RoomError> {
        self.mutate(task_id, |ctx, now| {
            ctx.task_plan = plan.to_string();
            ctx.updated_at = now;
            Ok(())
        })
    }

    /// Append a note.
    pub fn add_note(&self, task_id: &str, note: &str) -> Result<PlanningContext, RoomError> {
        self.mutate(task_id, |ctx, now| {
            ctx.add_note(note, now);
            Ok(())
        })
    }

    /// Append an error entry.
    pub fn log_error(
        &self,
        task_id: &str,
        kind: &str,
        message: &str,
        context: Option<String>,
    ) -> Result<PlanningContext, RoomError> {
        self.mutate(task_id, |ctx, now| {
            ctx.log_error(
                ErrorEntry {
                    timestamp: now,
                    kind: kind.to_string(),
                    message: message.to_string(),
                    context,
                    resolved: false,
                },
                now,
            );
            Ok(())
        })
    }

    /// Flip `resolved` on the error at `index`.
    pub fn resolve_error(&self, task_id: &str, index: usize) -> Result<PlanningContext, RoomError> {
        self.mutate(task_id, |ctx, now| ctx.resolve_error(index, now))
    }

    /// Replace the deliverable.
    pub fn set_deliverable(
        &self,
        task_id: &str,
        deliverable: &str,
    ) -> Result<PlanningContext, RoomError> {
        self.mutate(task_id, |ctx, now| {
            ctx.deliverable = deliverable.to_string();
            ctx.updated_at = now;
            Ok(())
        })
    }

    /// Read the context, rebuilding any missing markdown views.
    pub fn get(&self, task_id: &str) -> Result<Option<PlanningContext>, RoomError> {
        validate_task_id(task_id)?;
        let path = self.store.paths().planning_context(task_id);
        let ctx: Option<PlanningContext> = read_json(&path)?;
        if let Some(ctx) = &ctx {
            let dir = self.store.paths().planning_dir(task_id);
            if !views_present(&dir) {
                debug!(task = task_id, "rebuilding planning views from context.json");
                with_file_lock(&path, || render_views(&dir, ctx))?;
            }
        }
        Ok(ctx)
    }

    fn mutate(
        &self,
        task_id: &str,
        f: impl FnOnce(&mut PlanningContext, DateTime<Utc>) -> Result<(), RoomError>,
    ) -> Result<PlanningContext, RoomError> {
        validate_task_id(task_id)?;
        let now = self.clock.now();
        let path = self.store.paths().planning_context(task_id);
        let dir = self.store.paths().planning_dir(task_id);
        with_file_lock(&path, || {
            let mut ctx: PlanningContext =
                read_json(&path)?.unwrap_or_else(|| PlanningContext::new(task_id, now));
            f(&mut ctx, now)?;
            write_json_atomic(&path, &ctx)?;
            render_views(&dir, &ctx)?;
            Ok(ctx)
        })
    }
}

const VIEW_FILES: [&str; 4] = ["task_plan.md", "notes.md", "errors.md", "deliverable.md"];

fn views_present(dir: &Path) -> bool {
    VIEW_FILES.iter().all(|name| dir.join(name).exists())
}

fn render_views(dir: &Path, ctx: &PlanningContext) -> Result<(), RoomError> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("task_plan.md"), &ctx.task_plan)?;
    std::fs::write(dir.join("notes.md"), ctx.notes_markdown())?;
    std::fs::write(dir.join("errors.md"), ctx.errors_markdown())?;
    std::fs::write(dir.join("deliverable.md"), &ctx.deliverable)?;
    Ok(())
}

#[cfg(test)]
#[path = "planning_tests.rs"]
mod tests;
