// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Presence handlers: join, leave, who, heartbeat.

use masc_core::{Clock, RoomError};
use masc_engine::JoinRequest;

use super::args::{str_arg, string_list, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

pub(crate) fn join<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        // An explicit agent_name wins; otherwise the resolved session
        // identity is only a fallback identity, not a nickname choice, so
        // a bare type still gets a generated nickname.
        let explicit = str_arg(call.args, "agent_name").map(str::to_string);
        let agent_type = str_arg(call.args, "agent_type").unwrap_or("agent").to_string();

        let record = d.coord.join(JoinRequest {
            name: explicit,
            agent_type,
            capabilities: string_list(call.args, "capabilities"),
            session_id: Some(call.session_id.to_string()),
            pid: u64_arg(call.args, "pid").map(|p| p as u32),
            hostname: str_arg(call.args, "hostname").map(str::to_string),
            tty: str_arg(call.args, "tty").map(str::to_string),
            worktree: str_arg(call.args, "worktree").map(str::to_string),
            parent_task: str_arg(call.args, "parent_task").map(str::to_string),
        })?;

        d.remember_identity(call.session_id, &record.name);
        Ok(format!("✅ Joined as {} ({})", record.name, record.agent_type))
    })
}

pub(crate) fn leave<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        if d.coord.leave(call.agent)? {
            Ok(format!("✅ {} left the room", call.agent))
        } else {
            Ok(format!("{} was not in the room; nothing to do", call.agent))
        }
    })
}

pub(crate) fn who<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    _call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let entries = d.coord.who()?;
        if entries.is_empty() {
            return Ok("No agents in the room".to_string());
        }
        let pending = d.coord.sessions.pending_counts();
        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                let task = e.current_task.as_deref().unwrap_or("-");
                let zombie = if e.is_zombie { " [zombie]" } else { "" };
                let mail = pending.get(&e.name).copied().unwrap_or(0);
                format!(
                    "{} ({}) task={task} mail={mail} last_seen={}{zombie}",
                    e.name,
                    e.status,
                    e.last_seen.to_rfc3339(),
                )
            })
            .collect();
        Ok(lines.join("\n"))
    })
}

pub(crate) fn heartbeat<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        match d.coord.heartbeat(call.agent) {
            Ok(()) => Ok(format!("✅ Heartbeat recorded for {}", call.agent)),
            Err(RoomError::AgentNotFound(name)) => {
                Ok(format!("{name} is not joined; heartbeat skipped"))
            }
            Err(e) => Err(e),
        }
    })
}
