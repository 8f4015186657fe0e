// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory lock handlers.

use masc_core::Clock;

use super::args::{required_str, u64_arg};
use super::{Dispatcher, HandlerFuture, ToolCall};

const DEFAULT_LOCK_TTL_S: u64 = 300;

pub(crate) fn lock<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let resource = required_str(call.args, "resource")?;
        let ttl_s = u64_arg(call.args, "ttl_s").unwrap_or(DEFAULT_LOCK_TTL_S);
        let record = d.coord.locks.acquire(resource, call.agent, ttl_s).await?;
        Ok(format!(
            "✅ Locked {} until {} ({})",
            record.resource,
            record.expires_at.to_rfc3339(),
            serde_json::to_string(&record).unwrap_or_default(),
        ))
    })
}

pub(crate) fn unlock<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let resource = required_str(call.args, "resource")?;
        d.coord.locks.release(resource, call.agent).await?;
        Ok(format!("✅ Unlocked {resource}"))
    })
}

pub(crate) fn list<'a, C: Clock + 'static>(
    d: &'a Dispatcher<C>,
    _call: ToolCall<'a>,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let records = d.coord.locks.list().await?;
        if records.is_empty() {
            return Ok("No live locks".to_string());
        }
        let lines: Vec<String> = records
            .iter()
            .map(|r| {
                format!("{} held by {} until {}", r.resource, r.owner, r.expires_at.to_rfc3339())
            })
            .collect();
        Ok(lines.join("\n"))
    })
}
