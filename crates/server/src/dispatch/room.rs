// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room lifecycle, status, GC, pause, cache, and registry handlers.

use masc_core::{Clock, RoomError, TaskStatus};

use super::args::{required_str, str_arg, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

const DEFAULT_CACHE_TTL_S: u64 = 300;
const DEFAULT_GC_DAYS: u64 = 7;

pub(crate) fn init<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let project = required_str(call.args, "project")?;
        let created = d.coord.init(project)?;
        if created {
            Ok(format!("✅ Room initialized for {project}"))
        } else {
            Ok("Room already initialized; state unchanged".to_string())
        }
    })
}

pub(crate) fn status<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    _call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let state = d.coord.state()?;
        let backlog = d.coord.tasks.list()?;
        let open = backlog.tasks.iter().filter(|t| t.status.is_open()).count();
        let done = backlog
            .tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Done { .. }))
            .count();
        let mut out = format!(
            "Room {} — backlog v{}: {} open / {} done of {} tasks; {} agents; message seq {}",
            state.project,
            backlog.version,
            open,
            done,
            backlog.tasks.len(),
            state.active_agents.len(),
            state.message_seq,
        );
        if let Some(paused) = &state.paused {
            out.push_str(&format!(
                "\n⏸ paused by {} ({})",
                paused.by,
                paused.reason.as_deref().unwrap_or("no reason given")
            ));
        }
        Ok(out)
    })
}

pub(crate) fn gc<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let days = u64_arg(call.args, "days").unwrap_or(DEFAULT_GC_DAYS) as u32;
        let report = d.coord.gc(days, call.agent).await?;
        Ok(format!(
            "✅ GC complete: {} tasks archived, {} zombies removed, {} messages pruned, {} pubsub entries pruned",
            report.archived_tasks,
            report.zombies_removed,
            report.messages_pruned,
            report.pubsub_pruned,
        ))
    })
}

pub(crate) fn pause<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let reason = str_arg(call.args, "reason").map(str::to_string);
        d.coord.pause(call.agent, reason)?;
        Ok("✅ Room paused".to_string())
    })
}

pub(crate) fn resume<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        d.coord.resume(call.agent)?;
        Ok("✅ Room resumed".to_string())
    })
}

pub(crate) fn cache_set<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let key = required_str(call.args, "key")?;
        let value = call
            .args
            .get("value")
            .cloned()
            .ok_or_else(|| RoomError::Validation("missing argument: value".to_string()))?;
        let ttl_s = u64_arg(call.args, "ttl_s").unwrap_or(DEFAULT_CACHE_TTL_S);
        d.coord.store().cache_set(key, value, ttl_s, d.coord.now())?;
        Ok(format!("✅ Cached {key} for {ttl_s}s"))
    })
}

pub(crate) fn cache_get<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let key = required_str(call.args, "key")?;
        match d.coord.store().cache_get(key, d.coord.now())? {
            Some(value) => Ok(value.to_string()),
            None => Ok(format!("Cache miss: {key}")),
        }
    })
}

pub(crate) fn rooms<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    _call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let registry = d.coord.store().load_registry()?;
        if registry.rooms.is_empty() {
            return Ok("No rooms registered".to_string());
        }
        let lines: Vec<String> = registry
            .rooms
            .iter()
            .map(|(name, path)| format!("{name} — {}", path.display()))
            .collect();
        Ok(lines.join("\n"))
    })
}
