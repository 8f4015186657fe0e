// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `masc://` resource URIs.
//!
//! Shapes: `masc://<id>`, `masc://<id>.json`, with an optional query
//! (`masc://messages.json?since_seq=3&limit=10`). Unknown ids map to
//! JSON-RPC `-32602` at the protocol layer.

use std::collections::HashMap;

use serde_json::{json, Value};

const SCHEME: &str = "masc://";

/// Resource ids the server exposes.
pub const RESOURCE_IDS: [&str; 8] =
    ["status", "tasks", "who", "agents", "messages", "events", "worktrees", "schema"];

/// A parsed resource reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: String,
    /// `.json` suffix selects the machine-readable rendering.
    pub json: bool,
    pub query: HashMap<String, String>,
}

impl ResourceRef {
    pub fn query_u64(&self, key: &str) -> Option<u64> {
        self.query.get(key).and_then(|v| v.parse().ok())
    }
}

/// Parse a `masc://` URI. `None` for a foreign scheme or unknown id.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceRef> {
    let rest = uri.strip_prefix(SCHEME)?;
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };
    let (id, json) = match path.strip_suffix(".json") {
        Some(id) => (id, true),
        None => (path, false),
    };
    if !RESOURCE_IDS.contains(&id) {
        return None;
    }

    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect();
    Some(ResourceRef { id: id.to_string(), json, query })
}

/// Entries for `resources/list`.
pub fn static_resources() -> Vec<Value> {
    RESOURCE_IDS
        .iter()
        .flat_map(|id| {
            [
                json!({
                    "uri": format!("{SCHEME}{id}"),
                    "name": *id,
                    "mimeType": "text/plain",
                }),
                json!({
                    "uri": format!("{SCHEME}{id}.json"),
                    "name": format!("{id} (json)"),
                    "mimeType": "application/json",
                }),
            ]
        })
        .collect()
}

/// Entries for `resources/templates/list`.
pub fn resource_templates() -> Vec<Value> {
    vec![
        json!({
            "uriTemplate": "masc://messages.json{?since_seq,limit}",
            "name": "messages",
            "mimeType": "application/json",
        }),
        json!({
            "uriTemplate": "masc://events.json{?limit}",
            "name": "events",
            "mimeType": "application/json",
        }),
    ]
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
