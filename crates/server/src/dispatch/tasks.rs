// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task handlers: add, list, transition, claim, claim_next.

use masc_core::{effective_priority, Clock, RoomError, TaskAction, TaskStatusKind};
use masc_engine::NewTask;

use super::args::{i64_arg, required_str, str_arg, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

const DEFAULT_PRIORITY: i64 = 3;

fn new_task_from(args: &serde_json::Value) -> Result<NewTask, RoomError> {
    Ok(NewTask {
        title: required_str(args, "title")?.to_string(),
        description: str_arg(args, "description").unwrap_or_default().to_string(),
        priority: i64_arg(args, "priority").unwrap_or(DEFAULT_PRIORITY),
        worktree: str_arg(args, "worktree").map(str::to_string),
    })
}

pub(crate) fn add_task<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let spec = new_task_from(call.args)?;
        let (task, version) = d.coord.add_task(spec, call.agent)?;
        Ok(format!("✅ Added {} \"{}\" (backlog v{version})", task.id, task.title))
    })
}

pub(crate) fn add_tasks<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let items = call
            .args
            .get("tasks")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| RoomError::Validation("missing argument: tasks".to_string()))?;
        let specs: Vec<NewTask> =
            items.iter().map(new_task_from).collect::<Result<_, _>>()?;
        let (tasks, version) = d.coord.add_tasks(specs, call.agent)?;
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        Ok(format!("✅ Added {} tasks: {} (backlog v{version})", ids.len(), ids.join(", ")))
    })
}

pub(crate) fn list_tasks<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let backlog = d.coord.tasks.list()?;
        let filter: Option<TaskStatusKind> = match str_arg(call.args, "status") {
            Some(raw) => Some(
                serde_json::from_value(serde_json::Value::String(raw.to_string()))
                    .map_err(|_| RoomError::Validation(format!("unknown status filter: {raw}")))?,
            ),
            None => None,
        };

        let now = d.coord.now();
        let lines: Vec<String> = backlog
            .tasks
            .iter()
            .filter(|t| filter.is_none_or(|f| TaskStatusKind::from(&t.status) == f))
            .map(|t| {
                let effective = effective_priority(t.priority, t.created_at, now);
                let assignee = t.status.assignee().unwrap_or("-");
                format!(
                    "{} [P{}→{}] {} ({}) — {}",
                    t.id, t.priority, effective, t.status, assignee, t.title
                )
            })
            .collect();
        if lines.is_empty() {
            return Ok(format!("No tasks (backlog v{})", backlog.version));
        }
        Ok(format!("Backlog v{}:\n{}", backlog.version, lines.join("\n")))
    })
}

pub(crate) fn transition<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let action_name = required_str(call.args, "action")?;
        let action = TaskAction::parse(
            action_name,
            str_arg(call.args, "notes").map(str::to_string),
            str_arg(call.args, "reason").map(str::to_string),
        )
        .ok_or_else(|| {
            RoomError::Validation(format!(
                "unknown action: {action_name} (expected claim|start|done|release|cancel)"
            ))
        })?;
        let expected_version = u64_arg(call.args, "expected_version");

        let outcome = d.coord.transition(task_id, &action, call.agent, expected_version)?;
        Ok(format!("✅ {}", outcome.summary()))
    })
}

pub(crate) fn claim<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let expected_version = u64_arg(call.args, "expected_version");
        let outcome =
            d.coord.transition(task_id, &TaskAction::Claim, call.agent, expected_version)?;
        Ok(format!("✅ {}", outcome.summary()))
    })
}

pub(crate) fn claim_next<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        match d.coord.claim_next(call.agent)? {
            Some(outcome) => Ok(format!("✅ {}", outcome.summary())),
            None => Ok("No unclaimed tasks available".to_string()),
        }
    })
}
