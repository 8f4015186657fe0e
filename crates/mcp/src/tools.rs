// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advertised tool catalog and feature-mode filtering.
//!
//! Every tool is advertised as `{name, description, inputSchema}`. The
//! room's feature mode selects which categories are visible; categories
//! with no in-core tools (worktree, voting, cost, …) stay in the bitset
//! for external tool packs.

use serde_json::{json, Value};

/// Feature category of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Core,
    Comm,
    Portal,
    Worktree,
    Health,
    Discovery,
    Voting,
    Interrupt,
    Cost,
    Auth,
    RateLimit,
    Encryption,
}

impl ToolCategory {
    const ALL: [ToolCategory; 12] = [
        ToolCategory::Core,
        ToolCategory::Comm,
        ToolCategory::Portal,
        ToolCategory::Worktree,
        ToolCategory::Health,
        ToolCategory::Discovery,
        ToolCategory::Voting,
        ToolCategory::Interrupt,
        ToolCategory::Cost,
        ToolCategory::Auth,
        ToolCategory::RateLimit,
        ToolCategory::Encryption,
    ];

    fn bit(self) -> u16 {
        1 << (Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as u16)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "core" => Some(ToolCategory::Core),
            "comm" => Some(ToolCategory::Comm),
            "portal" => Some(ToolCategory::Portal),
            "worktree" => Some(ToolCategory::Worktree),
            "health" => Some(ToolCategory::Health),
            "discovery" => Some(ToolCategory::Discovery),
            "voting" => Some(ToolCategory::Voting),
            "interrupt" => Some(ToolCategory::Interrupt),
            "cost" => Some(ToolCategory::Cost),
            "auth" => Some(ToolCategory::Auth),
            "ratelimit" => Some(ToolCategory::RateLimit),
            "encryption" => Some(ToolCategory::Encryption),
            _ => None,
        }
    }
}

/// Category bitset selected by the room's feature mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureModes(u16);

impl FeatureModes {
    pub fn minimal() -> Self {
        Self::of(&[ToolCategory::Core, ToolCategory::Health])
    }

    pub fn standard() -> Self {
        Self::of(&[
            ToolCategory::Core,
            ToolCategory::Comm,
            ToolCategory::Portal,
            ToolCategory::Health,
            ToolCategory::Discovery,
            ToolCategory::RateLimit,
        ])
    }

    pub fn full() -> Self {
        Self::of(&ToolCategory::ALL)
    }

    pub fn solo() -> Self {
        Self::of(&[ToolCategory::Core, ToolCategory::Portal, ToolCategory::Health])
    }

    pub fn of(categories: &[ToolCategory]) -> Self {
        Self(categories.iter().fold(0, |acc, c| acc | c.bit()))
    }

    /// Parse a mode name; `custom:<a>,<b>,…` selects explicit categories.
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "minimal" => Some(Self::minimal()),
            "standard" => Some(Self::standard()),
            "full" => Some(Self::full()),
            "solo" => Some(Self::solo()),
            _ => {
                let rest = mode.strip_prefix("custom:")?;
                let categories: Option<Vec<ToolCategory>> =
                    rest.split(',').map(|c| ToolCategory::parse(c.trim())).collect();
                Some(Self::of(&categories?))
            }
        }
    }

    pub fn enables(&self, category: ToolCategory) -> bool {
        self.0 & category.bit() != 0
    }
}

impl Default for FeatureModes {
    fn default() -> Self {
        Self::standard()
    }
}

/// One advertised tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ToolCategory,
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn advertisement(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

fn schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

/// The full tool catalog, unfiltered.
pub fn catalog() -> Vec<ToolSpec> {
    use ToolCategory::*;

    let agent = || string("acting agent name; resolved from the session when omitted");
    vec![
        ToolSpec {
            name: "masc_init",
            description: "Initialize the room (idempotent)",
            category: Core,
            input_schema: schema(json!({ "project": string("project name") }), &["project"]),
        },
        ToolSpec {
            name: "masc_status",
            description: "Room status: project, backlog version, agents, pause state",
            category: Core,
            input_schema: schema(json!({}), &[]),
        },
        ToolSpec {
            name: "masc_join",
            description: "Join the room; a bare agent type gets a generated nickname",
            category: Core,
            input_schema: schema(
                json!({
                    "agent_name": string("explicit nickname"),
                    "agent_type": string("agent type used for nickname generation"),
                    "capabilities": { "type": "array", "items": { "type": "string" } },
                }),
                &[],
            ),
        },
        ToolSpec {
            name: "masc_leave",
            description: "Leave the room",
            category: Core,
            input_schema: schema(json!({ "agent_name": agent() }), &[]),
        },
        ToolSpec {
            name: "masc_who",
            description: "List agents with status, current task, and zombie flag",
            category: Core,
            input_schema: schema(json!({}), &[]),
        },
        ToolSpec {
            name: "masc_add_task",
            description: "Add a task to the backlog",
            category: Core,
            input_schema: schema(
                json!({
                    "title": string("task title"),
                    "description": string("task description"),
                    "priority": integer("1 (highest) to 5"),
                    "worktree": string("optional worktree reference"),
                }),
                &["title"],
            ),
        },
        ToolSpec {
            name: "masc_add_tasks",
            description: "Add several tasks in one atomic batch",
            category: Core,
            input_schema: schema(
                json!({
                    "tasks": {
                        "type": "array",
                        "items": schema(
                            json!({
                                "title": string("task title"),
                                "description": string("task description"),
                                "priority": integer("1 (highest) to 5"),
                            }),
                            &["title"],
                        ),
                    },
                }),
                &["tasks"],
            ),
        },
        ToolSpec {
            name: "masc_list_tasks",
            description: "List backlog tasks with status and effective priority",
            category: Core,
            input_schema: schema(json!({ "status": string("filter: todo|claimed|in_progress|done|cancelled") }), &[]),
        },
        ToolSpec {
            name: "masc_transition",
            description: "Apply claim|start|done|release|cancel to a task, optionally CAS-guarded",
            category: Core,
            input_schema: schema(
                json!({
                    "task_id": string("task-NNN"),
                    "action": string("claim|start|done|release|cancel"),
                    "agent_name": agent(),
                    "expected_version": integer("backlog version for compare-and-set"),
                    "notes": string("completion notes (done)"),
                    "reason": string("cancellation reason (cancel)"),
                }),
                &["task_id", "action"],
            ),
        },
        ToolSpec {
            name: "masc_claim",
            description: "Claim a task (wrapper over masc_transition)",
            category: Core,
            input_schema: schema(
                json!({
                    "task_id": string("task-NNN"),
                    "agent_name": agent(),
                    "expected_version": integer("backlog version for compare-and-set"),
                }),
                &["task_id"],
            ),
        },
        ToolSpec {
            name: "masc_claim_next",
            description: "Claim the best unclaimed task by effective priority",
            category: Core,
            input_schema: schema(json!({ "agent_name": agent() }), &[]),
        },
        ToolSpec {
            name: "masc_gc",
            description: "Archive stale tasks, reap zombies, prune old messages",
            category: Core,
            input_schema: schema(json!({ "days": integer("retention window (default 7)") }), &[]),
        },
        ToolSpec {
            name: "masc_pause",
            description: "Pause the room; task mutations are refused until resume",
            category: Core,
            input_schema: schema(json!({ "reason": string("why"), "agent_name": agent() }), &[]),
        },
        ToolSpec {
            name: "masc_resume",
            description: "Resume a paused room",
            category: Core,
            input_schema: schema(json!({ "agent_name": agent() }), &[]),
        },
        ToolSpec {
            name: "masc_cache_set",
            description: "Store a value in the room cache with a TTL",
            category: Core,
            input_schema: schema(
                json!({
                    "key": string("cache key"),
                    "value": { "description": "any JSON value" },
                    "ttl_s": integer("seconds to live (default 300)"),
                }),
                &["key", "value"],
            ),
        },
        ToolSpec {
            name: "masc_cache_get",
            description: "Read a cached value (miss once the TTL lapses)",
            category: Core,
            input_schema: schema(json!({ "key": string("cache key") }), &["key"]),
        },
        ToolSpec {
            name: "masc_lock",
            description: "Acquire a TTL advisory lock on a room resource",
            category: Core,
            input_schema: schema(
                json!({
                    "resource": string("room-relative path"),
                    "ttl_s": integer("seconds to live (default 300)"),
                    "agent_name": agent(),
                }),
                &["resource"],
            ),
        },
        ToolSpec {
            name: "masc_unlock",
            description: "Release an advisory lock you hold",
            category: Core,
            input_schema: schema(
                json!({ "resource": string("room-relative path"), "agent_name": agent() }),
                &["resource"],
            ),
        },
        ToolSpec {
            name: "masc_locks",
            description: "List live advisory locks",
            category: Core,
            input_schema: schema(json!({}), &[]),
        },
        ToolSpec {
            name: "masc_broadcast",
            description: "Send a message to every agent (or one, via mention)",
            category: Comm,
            input_schema: schema(
                json!({
                    "content": string("message body"),
                    "mention": string("deliver only to this agent"),
                    "agent_name": agent(),
                }),
                &["content"],
            ),
        },
        ToolSpec {
            name: "masc_wait_for_message",
            description: "Block until a message arrives or the timeout lapses",
            category: Comm,
            input_schema: schema(
                json!({
                    "timeout_s": integer("seconds to wait (0 returns immediately)"),
                    "agent_name": agent(),
                }),
                &[],
            ),
        },
        ToolSpec {
            name: "masc_check_messages",
            description: "Drain pending messages without blocking",
            category: Comm,
            input_schema: schema(
                json!({ "limit": integer("max messages (default 10)"), "agent_name": agent() }),
                &[],
            ),
        },
        ToolSpec {
            name: "masc_plan_set",
            description: "Set the plan for a task",
            category: Portal,
            input_schema: schema(
                json!({ "task_id": string("task-NNN"), "plan": string("markdown plan") }),
                &["task_id", "plan"],
            ),
        },
        ToolSpec {
            name: "masc_plan_note",
            description: "Append a note to a task's planning context",
            category: Portal,
            input_schema: schema(
                json!({ "task_id": string("task-NNN"), "note": string("note text") }),
                &["task_id", "note"],
            ),
        },
        ToolSpec {
            name: "masc_plan_error",
            description: "Log an error against a task",
            category: Portal,
            input_schema: schema(
                json!({
                    "task_id": string("task-NNN"),
                    "error_type": string("classification"),
                    "message": string("what happened"),
                    "context": string("optional context"),
                }),
                &["task_id", "message"],
            ),
        },
        ToolSpec {
            name: "masc_plan_resolve_error",
            description: "Mark a logged error resolved by index",
            category: Portal,
            input_schema: schema(
                json!({ "task_id": string("task-NNN"), "index": integer("zero-based error index") }),
                &["task_id", "index"],
            ),
        },
        ToolSpec {
            name: "masc_plan_deliverable",
            description: "Set the deliverable for a task",
            category: Portal,
            input_schema: schema(
                json!({ "task_id": string("task-NNN"), "deliverable": string("markdown deliverable") }),
                &["task_id", "deliverable"],
            ),
        },
        ToolSpec {
            name: "masc_plan_get",
            description: "Read a task's planning context",
            category: Portal,
            input_schema: schema(json!({ "task_id": string("task-NNN") }), &["task_id"]),
        },
        ToolSpec {
            name: "masc_heartbeat",
            description: "Refresh the agent's liveness timestamp",
            category: Health,
            input_schema: schema(json!({ "agent_name": agent() }), &[]),
        },
        ToolSpec {
            name: "masc_rooms",
            description: "List known rooms from the registry",
            category: Discovery,
            input_schema: schema(json!({}), &[]),
        },
    ]
}

/// Catalog filtered by the room's feature modes.
pub fn filtered_catalog(modes: FeatureModes) -> Vec<ToolSpec> {
    catalog().into_iter().filter(|tool| modes.enables(tool.category)).collect()
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
