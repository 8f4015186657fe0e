// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the room engine.
//!
//! Domain errors are returned as values from core operations and mapped at
//! the dispatcher boundary to `(false, message)` tool results. Only the
//! transport layer translates protocol-level failures into JSON-RPC error
//! objects.

use thiserror::Error;

/// Errors from room state, task, lock, and persistence operations.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room not initialized. Run masc_init first.")]
    NotInitialized,

    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already claimed by {by}")]
    TaskAlreadyClaimed { by: String },

    #[error("Task is not claimed")]
    TaskNotClaimed,

    #[error("{0}")]
    TaskInvalidState(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("{resource} is locked by {by}")]
    FileLocked { resource: String, by: String },

    #[error("{resource} is not locked")]
    FileNotLocked { resource: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited. Retry in {wait_s:.1}s")]
    RateLimited { wait_s: f64 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for RoomError {
    fn from(e: serde_json::Error) -> Self {
        RoomError::InvalidJson(e.to_string())
    }
}

impl RoomError {
    /// Version-mismatch CAS failure, surfaced as an invalid-state error
    /// carrying both versions so clients can refresh and retry.
    pub fn version_mismatch(expected: u64, got: u64) -> Self {
        RoomError::TaskInvalidState(format!("Version mismatch (expected {expected}, got {got})"))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
