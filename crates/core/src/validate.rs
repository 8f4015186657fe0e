// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input validation for ids, names, priorities, and resource paths.

use crate::error::RoomError;

/// Validate a `task-NNN` id shape.
pub fn validate_task_id(id: &str) -> Result<(), RoomError> {
    let ok = id
        .strip_prefix("task-")
        .map(|n| !n.is_empty() && n.len() <= 9 && n.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(RoomError::Validation(format!("invalid task id: {id:?} (expected task-NNN)")))
    }
}

/// Validate an agent nickname: 1–64 chars from `[A-Za-z0-9_-]`.
pub fn validate_agent_name(name: &str) -> Result<(), RoomError> {
    let ok = !name.is_empty()
        && name.len() <= 64
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(RoomError::Validation(format!("invalid agent name: {name:?}")))
    }
}

/// Priorities are 1 (highest) through 5; anything else is rejected.
pub fn validate_priority(priority: i64) -> Result<u8, RoomError> {
    if (1..=5).contains(&priority) {
        Ok(priority as u8)
    } else {
        Err(RoomError::Validation(format!("priority {priority} out of range (1-5)")))
    }
}

/// Validate a lockable resource path: relative, no traversal, no control
/// bytes, bounded length. The same rules gate any path derived from caller
/// input before it is joined under the room base.
pub fn validate_resource(resource: &str) -> Result<(), RoomError> {
    if resource.is_empty() || resource.len() > 512 {
        return Err(RoomError::Validation("resource must be 1-512 bytes".to_string()));
    }
    if resource.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err(RoomError::Validation("resource contains control bytes".to_string()));
    }
    if resource.starts_with('/') || resource.starts_with('\\') || resource.contains(':') {
        return Err(RoomError::Validation(format!("resource must be a relative path: {resource:?}")));
    }
    if resource.split(['/', '\\']).any(|part| part == "..") {
        return Err(RoomError::Validation(format!("resource escapes the room: {resource:?}")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
