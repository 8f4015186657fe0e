// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planning context handlers.

use masc_core::Clock;

use super::args::{required_str, str_arg, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

pub(crate) fn set_plan<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let plan = required_str(call.args, "plan")?;
        d.coord.planning.set_plan(task_id, plan)?;
        Ok(format!("✅ Plan set for {task_id}"))
    })
}

pub(crate) fn add_note<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let note = required_str(call.args, "note")?;
        let ctx = d.coord.planning.add_note(task_id, note)?;
        Ok(format!("✅ Note {} added to {task_id}", ctx.notes.len()))
    })
}

pub(crate) fn log_error<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let message = required_str(call.args, "message")?;
        let kind = str_arg(call.args, "error_type").unwrap_or("error");
        let context = str_arg(call.args, "context").map(str::to_string);
        let ctx = d.coord.planning.log_error(task_id, kind, message, context)?;
        Ok(format!("✅ Error {} logged for {task_id}", ctx.errors.len() - 1))
    })
}

pub(crate) fn resolve_error<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let index = u64_arg(call.args, "index")
            .ok_or_else(|| masc_core::RoomError::Validation("missing argument: index".into()))?;
        d.coord.planning.resolve_error(task_id, index as usize)?;
        Ok(format!("✅ Error {index} resolved for {task_id}"))
    })
}

pub(crate) fn set_deliverable<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        let deliverable = required_str(call.args, "deliverable")?;
        d.coord.planning.set_deliverable(task_id, deliverable)?;
        Ok(format!("✅ Deliverable set for {task_id}"))
    })
}

pub(crate) fn get<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let task_id = required_str(call.args, "task_id")?;
        match d.coord.planning.get(task_id)? {
            Some(ctx) => Ok(serde_json::to_string_pretty(&ctx)?),
            None => Ok(format!("No planning context for {task_id}")),
        }
    })
}
