// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{Duration, Utc};

use crate::error::RoomError;

use super::{ErrorEntry, PlanningContext};

fn entry(kind: &str, message: &str) -> ErrorEntry {
    ErrorEntry {
        timestamp: Utc::now(),
        kind: kind.into(),
        message: message.into(),
        context: None,
        resolved: false,
    }
}

#[test]
fn errors_append_in_order() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-001", now);
    ctx.log_error(entry("build", "first"), now);
    ctx.log_error(entry("test", "second"), now);
    assert_eq!(ctx.errors[0].message, "first");
    assert_eq!(ctx.errors[1].message, "second");
}

#[test]
fn resolve_error_flips_by_index() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-001", now);
    ctx.log_error(entry("build", "broken import"), now);
    ctx.log_error(entry("test", "flaky case"), now);

    ctx.resolve_error(1, now + Duration::seconds(5)).unwrap();
    assert!(!ctx.errors[0].resolved);
    assert!(ctx.errors[1].resolved);
    assert_eq!(ctx.updated_at, now + Duration::seconds(5));
}

#[test]
fn resolve_error_out_of_range_is_validation_error() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-001", now);
    let err = ctx.resolve_error(3, now).unwrap_err();
    match err {
        RoomError::Validation(msg) => assert!(msg.contains("out of range"), "{msg}"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn add_note_bumps_updated_at() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-001", now);
    ctx.add_note("check the lock path first", now + Duration::seconds(1));
    assert_eq!(ctx.notes.len(), 1);
    assert!(ctx.updated_at > ctx.created_at);
}

#[test]
fn markdown_views_reflect_state() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-002", now);
    ctx.add_note("split the codec", now);
    ctx.log_error(entry("io", "disk full"), now);
    ctx.resolve_error(0, now).unwrap();

    assert!(ctx.notes_markdown().contains("- split the codec"));
    let errors = ctx.errors_markdown();
    assert!(errors.contains("[x] 0."));
    assert!(errors.contains("disk full"));
}

#[test]
fn context_round_trips() {
    let now = Utc::now();
    let mut ctx = PlanningContext::new("task-003", now);
    ctx.task_plan = "1. read 2. write".into();
    ctx.deliverable = "a codec".into();
    let back: PlanningContext =
        serde_json::from_str(&serde_json::to_string(&ctx).unwrap()).unwrap();
    assert_eq!(back, ctx);
}
