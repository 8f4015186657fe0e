// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! masc-server: MCP control plane over the room coordination engine.
//!
//! The tool dispatcher routes `tools/call` invocations into the engine;
//! the MCP layer speaks JSON-RPC 2.0; the stdio and HTTP transports frame
//! it onto the wire.

pub mod dispatch;
pub mod env;
pub mod http;
pub mod mcp;
pub mod metrics;
pub mod stdio;

pub use dispatch::Dispatcher;
pub use http::{build_router, serve, HttpState};
pub use mcp::McpServer;
pub use metrics::Metrics;
