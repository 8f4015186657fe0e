// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.

use std::net::SocketAddr;

/// Server version (from Cargo.toml).
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name advertised in `initialize` and `/health`.
pub const SERVER_NAME: &str = "masc";

/// Maximum accepted HTTP body size (`MASC_MCP_MAX_BODY_BYTES`, default 20 MiB).
pub fn max_body_bytes() -> usize {
    std::env::var("MASC_MCP_MAX_BODY_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(20 * 1024 * 1024)
}

/// Record tool-call durations when `MASC_TELEMETRY_ENABLED` is truthy.
pub fn telemetry_enabled() -> bool {
    std::env::var("MASC_TELEMETRY_ENABLED")
        .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// At-rest encryption key, handed to the external crypto collaborator.
pub fn encryption_key() -> Option<String> {
    std::env::var("MASC_ENCRYPTION_KEY").ok().filter(|s| !s.is_empty())
}

/// Cluster name attached to telemetry and `/health`.
pub fn cluster_name() -> Option<String> {
    std::env::var("MASC_CLUSTER_NAME").ok().filter(|s| !s.is_empty())
}

/// Terminal session id used as the identity fallback for stdio clients.
pub fn term_session_id() -> Option<String> {
    std::env::var("TERM_SESSION_ID").ok().filter(|s| !s.is_empty())
}

/// HTTP bind address (`MASC_HTTP_ADDR`, default `127.0.0.1:8787`).
pub fn http_addr() -> SocketAddr {
    std::env::var("MASC_HTTP_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)))
}

/// Zombie threshold override in seconds (`MASC_ZOMBIE_THRESHOLD_S`).
pub fn zombie_threshold_s() -> Option<i64> {
    std::env::var("MASC_ZOMBIE_THRESHOLD_S").ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
