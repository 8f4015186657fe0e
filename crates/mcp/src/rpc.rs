// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 envelope parsing and response construction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Request id: string or integer. `null`, booleans, floats, and structured
/// values are disallowed by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Num(i64),
    Str(String),
}

/// A validated incoming request (or notification, when `id` is absent).
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub method: String,
    pub id: Option<RequestId>,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Classification of one wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// A response object from the peer; dropped silently.
    PeerResponse,
    /// Malformed: answer with this pre-built error envelope.
    Malformed(Value),
}

/// Parse and validate one JSON-RPC message body.
pub fn parse_message(body: &[u8]) -> Incoming {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return Incoming::Malformed(error_response(
                None,
                PARSE_ERROR,
                "Parse error",
                Some(json!(e.to_string())),
            ))
        }
    };

    let Some(obj) = value.as_object() else {
        return Incoming::Malformed(invalid_request(None, "request must be an object"));
    };

    // A response object (result/error, no method) from the peer is dropped.
    if !obj.contains_key("method") && (obj.contains_key("result") || obj.contains_key("error")) {
        return Incoming::PeerResponse;
    }

    let id = match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(RequestId::Str(s.clone())),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(n) => Some(RequestId::Num(n)),
            None => return Incoming::Malformed(invalid_request(None, "id must be an integer")),
        },
        Some(_) => {
            return Incoming::Malformed(invalid_request(None, "id must be a string or integer"))
        }
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Incoming::Malformed(invalid_request(id, "jsonrpc must be \"2.0\""));
    }

    let method = match obj.get("method").and_then(Value::as_str) {
        Some(method) if !method.is_empty() => method.to_string(),
        _ => return Incoming::Malformed(invalid_request(id, "method must be a string")),
    };

    let params = match obj.get("params") {
        None => Value::Null,
        Some(params @ (Value::Object(_) | Value::Array(_) | Value::Null)) => params.clone(),
        Some(_) => {
            return Incoming::Malformed(error_response(
                id,
                INVALID_PARAMS,
                "params must be structured",
                None,
            ))
        }
    };

    Incoming::Request(JsonRpcRequest { method, id, params })
}

/// Successful response envelope.
pub fn ok_response(id: RequestId, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Error response envelope. A missing id serializes as `null`, as required
/// for parse errors.
pub fn error_response(id: Option<RequestId>, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": error,
    })
}

fn invalid_request(id: Option<RequestId>, detail: &str) -> Value {
    error_response(id, INVALID_REQUEST, "Invalid Request", Some(json!(detail)))
}

/// MCP tool result payload: text content plus the `isError` marker. Tool
/// failures ride inside a *successful* JSON-RPC response.
pub fn tool_result(success: bool, text: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": !success,
    })
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
