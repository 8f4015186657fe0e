// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool dispatcher: routes a named tool call plus a JSON argument object
//! to a handler and produces `(success, text)`.
//!
//! Cross-cutting behavior lives here — agent identity resolution, the join
//! gate, auto-heartbeat, rate limiting, panic isolation, audit, and the
//! one-line call summary. Handlers stay thin: destructure arguments, call
//! one or two engine operations, format a response.

mod agents;
mod args;
mod locks;
mod messaging;
mod planning;
mod room;
mod tasks;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use masc_core::{generate_anonymous_name, validate_agent_name, Clock, RoomError, SystemClock};
use masc_engine::{Coordinator, RateCategory, Role};
use masc_mcp::FeatureModes;

use crate::env;
use crate::metrics::Metrics;

/// One in-flight tool invocation.
pub struct ToolCall<'a> {
    pub agent: &'a str,
    pub args: &'a Value,
    pub session_id: &'a str,
    pub cancel: &'a CancellationToken,
}

type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<String, RoomError>> + Send + 'a>>;
type Handler<C> = for<'a> fn(&'a Dispatcher<C>, ToolCall<'a>) -> HandlerFuture<'a>;

/// Routing entry: the handler plus its admission classification.
struct ToolEntry<C: Clock + 'static> {
    handler: Handler<C>,
    /// Requires the acting agent to be joined.
    gated: bool,
    /// Mutates room state: auto-registers the agent and is rate limited.
    write: bool,
    category: RateCategory,
}

pub struct Dispatcher<C: Clock + 'static = SystemClock> {
    coord: Arc<Coordinator<C>>,
    metrics: Arc<Metrics>,
    modes: FeatureModes,
    telemetry: bool,
    table: HashMap<&'static str, ToolEntry<C>>,
}

impl<C: Clock + 'static> Dispatcher<C> {
    pub fn new(coord: Arc<Coordinator<C>>, metrics: Arc<Metrics>, modes: FeatureModes) -> Self {
        Self {
            coord,
            metrics,
            modes,
            telemetry: env::telemetry_enabled(),
            table: routes(),
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator<C>> {
        &self.coord
    }

    pub fn modes(&self) -> FeatureModes {
        self.modes
    }

    /// Dispatch one tool call. Never panics and never returns a transport
    /// error: every failure becomes `(false, message)`.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &Value,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> (bool, String) {
        let started = Instant::now();

        let agent = match self.resolve_agent(arguments, session_id) {
            Ok(agent) => agent,
            Err(e) => return (false, format!("❌ {e}")),
        };

        let result = match self.table.get(name) {
            Some(entry) => self.run(entry, &agent, arguments, session_id, cancel).await,
            None => return (false, format!("Unknown tool: {name}")),
        };

        let (success, text) = match result {
            Ok(text) => (true, text),
            Err(e) => (false, format!("❌ {e}")),
        };

        self.coord.events.emit(&agent, "tool_call", success, Some(name.to_string()));
        let preview: String = text.replace('\n', " ").chars().take(80).collect();
        info!(agent = %agent, tool = name, success, "{preview}");
        let micros = self.telemetry.then(|| started.elapsed().as_micros() as u64);
        self.metrics.record_tool_call(success, micros);

        (success, text)
    }

    async fn run(
        &self,
        entry: &ToolEntry<C>,
        agent: &str,
        arguments: &Value,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, RoomError> {
        if entry.gated && !self.coord.is_joined(agent)? {
            return Err(RoomError::Validation(format!(
                "Join required: {agent} is not in the room. Call masc_join first."
            )));
        }

        // Auto-heartbeat on every dispatched call; write tools also get a
        // mailbox if they don't have one yet.
        if entry.write {
            self.coord.sessions.register(agent);
        }
        self.coord.touch(agent);

        if entry.write {
            let decision = self.coord.sessions.check_rate_limit(agent, entry.category, Role::Worker);
            if !decision.allowed {
                return Err(RoomError::RateLimited { wait_s: decision.wait_s });
            }
        }

        let call = ToolCall { agent, args: arguments, session_id, cancel };
        match std::panic::AssertUnwindSafe((entry.handler)(self, call)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let preview = panic_preview(panic.as_ref());
                error!(agent = %agent, "tool handler panicked: {preview}");
                Err(RoomError::Internal(preview))
            }
        }
    }

    /// Resolve the acting agent name: explicit argument, session-scoped
    /// identity file, terminal-session identity file, or a freshly
    /// generated `agent-<uuid8>` persisted to the session path.
    fn resolve_agent(&self, arguments: &Value, session_id: &str) -> Result<String, RoomError> {
        if let Some(name) = args::str_arg(arguments, "agent_name") {
            validate_agent_name(name)?;
            return Ok(name.to_string());
        }

        let store = self.coord.store();
        if let Some(name) = store.read_session_identity(session_id)? {
            return Ok(name);
        }
        if let Some(term) = env::term_session_id() {
            if let Some(name) = store.read_session_identity(&format!("term-{term}"))? {
                store.write_session_identity(session_id, &name)?;
                return Ok(name);
            }
        }

        let name = generate_anonymous_name();
        store.write_session_identity(session_id, &name)?;
        Ok(name)
    }

    /// Persist the resolved identity for this session (called by join).
    fn remember_identity(&self, session_id: &str, name: &str) {
        let store = self.coord.store();
        if let Err(e) = store.write_session_identity(session_id, name) {
            error!(error = %e, "failed to persist session identity");
        }
        if let Some(term) = env::term_session_id() {
            let _ = store.write_session_identity(&format!("term-{term}"), name);
        }
    }
}

fn panic_preview(panic: &(dyn std::any::Any + Send)) -> String {
    let text = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string());
    text.replace('\n', " ").chars().take(80).collect()
}

/// The tool routing table.
fn routes<C: Clock + 'static>() -> HashMap<&'static str, ToolEntry<C>> {
    use RateCategory::*;

    let mut table: HashMap<&'static str, ToolEntry<C>> = HashMap::new();
    let mut add = |name: &'static str,
                   handler: Handler<C>,
                   gated: bool,
                   write: bool,
                   category: RateCategory| {
        table.insert(name, ToolEntry { handler, gated, write, category });
    };

    // Room
    add("masc_init", room::init, false, true, General);
    add("masc_status", room::status, false, false, General);
    add("masc_gc", room::gc, true, true, General);
    add("masc_pause", room::pause, true, true, General);
    add("masc_resume", room::resume, true, true, General);
    add("masc_cache_set", room::cache_set, false, true, General);
    add("masc_cache_get", room::cache_get, false, false, General);
    add("masc_rooms", room::rooms, false, false, General);

    // Presence
    add("masc_join", agents::join, false, true, General);
    add("masc_leave", agents::leave, false, true, General);
    add("masc_who", agents::who, false, false, General);
    add("masc_heartbeat", agents::heartbeat, false, true, General);

    // Tasks
    add("masc_add_task", tasks::add_task, true, true, TaskOps);
    add("masc_add_tasks", tasks::add_tasks, true, true, TaskOps);
    add("masc_list_tasks", tasks::list_tasks, false, false, General);
    add("masc_transition", tasks::transition, true, true, TaskOps);
    add("masc_claim", tasks::claim, true, true, TaskOps);
    add("masc_claim_next", tasks::claim_next, true, true, TaskOps);

    // Messaging
    add("masc_broadcast", messaging::broadcast, false, true, Broadcast);
    add("masc_wait_for_message", messaging::wait_for_message, false, false, General);
    add("masc_check_messages", messaging::check_messages, false, false, General);

    // Locks
    add("masc_lock", locks::lock, true, true, FileLock);
    add("masc_unlock", locks::unlock, true, true, FileLock);
    add("masc_locks", locks::list, false, false, General);

    // Planning
    add("masc_plan_set", planning::set_plan, true, true, General);
    add("masc_plan_note", planning::add_note, true, true, General);
    add("masc_plan_error", planning::log_error, true, true, General);
    add("masc_plan_resolve_error", planning::resolve_error, true, true, General);
    add("masc_plan_deliverable", planning::set_deliverable, true, true, General);
    add("masc_plan_get", planning::get, false, false, General);

    table
}

#[cfg(test)]
#[path = "../dispatch_tests.rs"]
mod tests;
