// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room garbage collection: archive stale tasks, reap zombie agents,
//! prune messages and retained pub/sub entries.

use chrono::Duration;
use serde::Serialize;
use tracing::info;

use masc_core::{task_number, Clock, RoomError};

use crate::coordinator::Coordinator;

const PUBSUB_KEEP_MESSAGES: usize = 1000;

/// What one GC pass removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GcReport {
    pub archived_tasks: usize,
    pub zombies_removed: usize,
    pub messages_pruned: usize,
    pub pubsub_pruned: usize,
}

impl<C: Clock + 'static> Coordinator<C> {
    /// Run a GC pass with a `days` retention window.
    ///
    /// - Open (non-done) tasks older than the window move to the archive;
    ///   their ids stay counted so numbering never reuses them.
    /// - Agents past the zombie threshold are removed.
    /// - Messages older than the window are pruned unless their content
    ///   mentions a still-open task id.
    pub async fn gc(&self, days: u32, actor: &str) -> Result<GcReport, RoomError> {
        let now = self.now();
        let cutoff = now - Duration::days(days as i64);
        let mut report = GcReport::default();

        // Snapshot open ids before archiving: a mention of a task archived
        // in this very pass still protects the message.
        let open_ids: Vec<u64> = self
            .tasks
            .list()?
            .tasks
            .iter()
            .filter(|t| t.status.is_open())
            .filter_map(|t| task_number(&t.id))
            .collect();

        report.archived_tasks = self.tasks.archive_older_than(cutoff)?.len();

        let threshold = self.config().zombie_threshold;
        for agent in self.store().list_agents()? {
            if agent.is_zombie(now, threshold) {
                self.store().remove_agent(&agent.name)?;
                self.store().update_state(|state| {
                    state.remove_agent(&agent.name);
                    Ok(())
                })?;
                self.sessions.unregister(&agent.name);
                report.zombies_removed += 1;
            }
        }

        report.messages_pruned = self.store().prune_messages(|message| {
            if message.timestamp >= cutoff {
                return true;
            }
            mentioned_task_ids(&message.content).any(|n| open_ids.contains(&n))
        })?;

        report.pubsub_pruned =
            self.backend().cleanup_pubsub(days, PUBSUB_KEEP_MESSAGES).await?;

        info!(
            archived = report.archived_tasks,
            zombies = report.zombies_removed,
            messages = report.messages_pruned,
            "gc pass complete"
        );
        self.events.emit(
            actor,
            "gc",
            true,
            serde_json::to_string(&report).ok(),
        );
        Ok(report)
    }
}

/// Task numbers mentioned as `task-NNN` in free text.
fn mentioned_task_ids(content: &str) -> impl Iterator<Item = u64> + '_ {
    content.split(|c: char| !c.is_ascii_alphanumeric() && c != '-').filter_map(task_number)
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;
