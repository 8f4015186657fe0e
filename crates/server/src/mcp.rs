// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP method routing over JSON-RPC 2.0.
//!
//! Protocol-level failures become JSON-RPC error objects here; tool-level
//! failures always ride inside a successful response as `isError: true`.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use masc_core::{effective_priority, Clock, SystemClock, PROTOCOL_VERSION};
use masc_mcp::{
    error_response, ok_response, parse_message, parse_resource_uri, resource_templates,
    static_resources, tool_result, Incoming, JsonRpcRequest, ResourceRef, INTERNAL_ERROR,
    INVALID_PARAMS, METHOD_NOT_FOUND,
};

use crate::dispatch::Dispatcher;
use crate::env::{SERVER_NAME, SERVER_VERSION};

/// Protocol versions we accept and echo back unchanged.
const KNOWN_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];

const INSTRUCTIONS: &str = "MASC coordinates multiple agents in a shared room. \
Call masc_join to enter, masc_claim_next to pick up work, masc_broadcast to talk, \
and masc_transition to move tasks through their lifecycle.";

type MethodResult = Result<Value, (i64, String, Option<Value>)>;

pub struct McpServer<C: Clock + 'static = SystemClock> {
    dispatcher: Arc<Dispatcher<C>>,
}

impl<C: Clock + 'static> McpServer<C> {
    pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
        &self.dispatcher
    }

    /// Handle one wire message. `None` means no response is written
    /// (notifications and peer responses).
    pub async fn handle(
        &self,
        body: &[u8],
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Option<Value> {
        match parse_message(body) {
            Incoming::Malformed(response) => Some(response),
            Incoming::PeerResponse => {
                debug!("dropping peer response");
                None
            }
            Incoming::Request(request) => self.handle_request(request, session_id, cancel).await,
        }
    }

    async fn handle_request(
        &self,
        request: JsonRpcRequest,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Option<Value> {
        let result: MethodResult = match request.method.as_str() {
            "initialize" => self.initialize(&request.params),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "resources/list" => Ok(json!({ "resources": static_resources() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": resource_templates() }))
            }
            "resources/read" => self.read_resource(&request.params),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            "tools/list" => {
                let tools: Vec<Value> = masc_mcp::filtered_catalog(self.dispatcher.modes())
                    .iter()
                    .map(|t| t.advertisement())
                    .collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(&request.params, session_id, cancel).await,
            _ => Err((METHOD_NOT_FOUND, "Method not found".to_string(), None)),
        };

        // Notifications are never answered.
        let id = request.id?;
        Some(match result {
            Ok(value) => ok_response(id, value),
            Err((code, message, data)) => error_response(Some(id), code, &message, data),
        })
    }

    fn initialize(&self, params: &Value) -> MethodResult {
        let requested = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("protocolVersion is required"))?;
        let negotiated = if KNOWN_PROTOCOL_VERSIONS.contains(&requested) {
            requested
        } else {
            PROTOCOL_VERSION
        };

        Ok(json!({
            "protocolVersion": negotiated,
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": {},
                "prompts": {},
            },
            "instructions": INSTRUCTIONS,
        }))
    }

    async fn call_tool(
        &self,
        params: &Value,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> MethodResult {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("tool name is required"))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        if !arguments.is_object() {
            return Err(invalid_params("arguments must be an object"));
        }

        let (success, text) =
            self.dispatcher.dispatch(name, &arguments, session_id, cancel).await;
        Ok(tool_result(success, &text))
    }

    fn read_resource(&self, params: &Value) -> MethodResult {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("uri is required"))?;
        let resource = parse_resource_uri(uri)
            .ok_or_else(|| invalid_params(&format!("unknown resource: {uri}")))?;

        let (mime, text) = self
            .render_resource(&resource)
            .map_err(|e| (INTERNAL_ERROR, e.to_string(), Some(json!(error_kind(&e)))))?;
        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": mime, "text": text }]
        }))
    }

    fn render_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<(&'static str, String), masc_core::RoomError> {
        let coord = self.dispatcher.coordinator();
        let mime = if resource.json { "application/json" } else { "text/plain" };

        let text = match resource.id.as_str() {
            "status" => {
                let state = coord.state()?;
                let backlog = coord.tasks.list()?;
                if resource.json {
                    json!({
                        "project": state.project,
                        "message_seq": state.message_seq,
                        "active_agents": state.active_agents,
                        "paused": state.paused,
                        "backlog_version": backlog.version,
                        "task_count": backlog.tasks.len(),
                    })
                    .to_string()
                } else {
                    format!(
                        "project={} tasks={} backlog_version={} agents={}",
                        state.project,
                        backlog.tasks.len(),
                        backlog.version,
                        state.active_agents.len(),
                    )
                }
            }
            "tasks" => {
                let backlog = coord.tasks.list()?;
                if resource.json {
                    json!({ "version": backlog.version, "tasks": backlog.tasks }).to_string()
                } else {
                    let now = coord.now();
                    backlog
                        .tasks
                        .iter()
                        .map(|t| {
                            format!(
                                "{} [P{}→{}] {} — {}",
                                t.id,
                                t.priority,
                                effective_priority(t.priority, t.created_at, now),
                                t.status,
                                t.title
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "who" | "agents" => {
                let entries = coord.who()?;
                if resource.json {
                    serde_json::to_string(&entries)?
                } else {
                    entries
                        .iter()
                        .map(|e| format!("{} ({})", e.name, e.status))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "messages" => {
                let since = resource.query_u64("since_seq").unwrap_or(0);
                let limit = resource.query_u64("limit").unwrap_or(50) as usize;
                let messages = coord.store().list_messages(since, limit)?;
                if resource.json {
                    serde_json::to_string(&messages)?
                } else {
                    messages
                        .iter()
                        .map(|m| format!("#{} {}: {}", m.seq, m.from_agent, m.content))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "events" => {
                let limit = resource.query_u64("limit").unwrap_or(50) as usize;
                let events = coord.events.recent(limit)?;
                if resource.json {
                    serde_json::to_string(&events)?
                } else {
                    events
                        .iter()
                        .map(|e| {
                            format!(
                                "{} {} {} ok={}",
                                e.timestamp.to_rfc3339(),
                                e.agent,
                                e.event_type,
                                e.success
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "worktrees" => {
                let backlog = coord.tasks.list()?;
                let refs: Vec<Value> = backlog
                    .tasks
                    .iter()
                    .filter_map(|t| {
                        t.worktree
                            .as_ref()
                            .map(|w| json!({ "task_id": t.id, "worktree": w }))
                    })
                    .collect();
                if resource.json {
                    json!({ "worktrees": refs }).to_string()
                } else {
                    refs.iter()
                        .map(|r| format!("{} — {}", r["task_id"], r["worktree"]))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "schema" => {
                let layout = json!({
                    "state": ".masc/state.json",
                    "backlog": ".masc/backlog.json",
                    "archive": ".masc/tasks-archive.json",
                    "agents": ".masc/agents/<nickname>.json",
                    "messages": ".masc/messages/<seq>_<agent>_broadcast.json",
                    "audit": ".masc/audit.log",
                    "planning": "planning/<task_id>/",
                });
                if resource.json {
                    layout.to_string()
                } else {
                    format!("{layout:#}")
                }
            }
            // parse_resource_uri only yields known ids
            _ => String::new(),
        };
        Ok((mime, text))
    }
}

fn invalid_params(detail: &str) -> (i64, String, Option<Value>) {
    (INVALID_PARAMS, "Invalid params".to_string(), Some(json!(detail)))
}

fn error_kind(e: &masc_core::RoomError) -> &'static str {
    use masc_core::RoomError::*;
    match e {
        NotInitialized => "NotInitialized",
        Validation(_) => "ValidationError",
        TaskNotFound(_) => "TaskNotFound",
        TaskAlreadyClaimed { .. } => "TaskAlreadyClaimed",
        TaskNotClaimed => "TaskNotClaimed",
        TaskInvalidState(_) => "TaskInvalidState",
        AgentNotFound(_) => "AgentNotFound",
        FileLocked { .. } => "FileLocked",
        FileNotLocked { .. } => "FileNotLocked",
        InvalidJson(_) => "InvalidJson",
        Io(_) => "IoError",
        RateLimited { .. } => "RateLimited",
        Cancelled => "Cancelled",
        Timeout => "Timeout",
        Internal(_) => "Internal",
    }
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
