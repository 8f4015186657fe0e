// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging handlers: broadcast, wait, drain.

use masc_core::{Clock, MessageKind};

use super::args::{required_str, str_arg, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

const DEFAULT_WAIT_S: u64 = 30;
const DEFAULT_DRAIN_LIMIT: u64 = 10;

pub(crate) fn broadcast<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let content = required_str(call.args, "content")?;
        let mention = str_arg(call.args, "mention").map(str::to_string);
        let kind = if mention.is_some() { MessageKind::Direct } else { MessageKind::Broadcast };
        let message = d.coord.post_message(call.agent, kind, content, mention)?;
        match &message.mention {
            Some(target) => Ok(format!("✅ Message #{} sent to {target}", message.seq)),
            None => Ok(format!("✅ Message #{} broadcast", message.seq)),
        }
    })
}

pub(crate) fn wait_for_message<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let timeout_s = u64_arg(call.args, "timeout_s").unwrap_or(DEFAULT_WAIT_S);
        d.coord.sessions.register(call.agent);
        match d.coord.sessions.wait_for_message(call.agent, timeout_s, call.cancel).await? {
            Some(message) => Ok(format!(
                "[#{} {} from {}] {}",
                message.seq, message.kind, message.from_agent, message.content
            )),
            None => Ok(format!("No message received within {timeout_s}s")),
        }
    })
}

pub(crate) fn check_messages<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let limit = u64_arg(call.args, "limit").unwrap_or(DEFAULT_DRAIN_LIMIT) as usize;
        d.coord.sessions.register(call.agent);
        let mut lines = Vec::new();
        while lines.len() < limit {
            match d.coord.sessions.pop_message(call.agent) {
                Some(message) => lines.push(format!(
                    "[#{} {} from {}] {}",
                    message.seq, message.kind, message.from_agent, message.content
                )),
                None => break,
            }
        }
        if lines.is_empty() {
            return Ok("No pending messages".to_string());
        }
        Ok(lines.join("\n"))
    })
}
