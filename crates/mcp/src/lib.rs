// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! masc-mcp: Model Context Protocol plumbing.
//!
//! JSON-RPC 2.0 envelopes and validation, `Content-Length` framing for the
//! stdio transport, the advertised tool catalog with feature-mode
//! filtering, and `masc://` resource URIs.

pub mod framing;
pub mod resources;
pub mod rpc;
pub mod tools;

pub use framing::{read_message, write_message, FramingError};
pub use rpc::{
    error_response, ok_response, parse_message, tool_result, Incoming, JsonRpcRequest, RequestId,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
pub use resources::{parse_resource_uri, resource_templates, static_resources, ResourceRef};
pub use tools::{catalog, filtered_catalog, FeatureModes, ToolCategory, ToolSpec};
