// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! masc-core: data model and state machines for the MASC coordination room.

pub mod macros;

pub mod agent;
pub mod clock;
pub mod error;
pub mod event;
pub mod lock;
pub mod message;
pub mod planning;
pub mod room;
pub mod task;
pub mod validate;

pub use agent::{generate_anonymous_name, generate_nickname, AgentRecord, AgentStatus};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::RoomError;
pub use event::AuditEvent;
pub use lock::ResourceLock;
pub use message::{sanitize_content, Message, MessageKind, MAX_MESSAGE_LEN};
pub use planning::{ErrorEntry, PlanningContext};
pub use room::{Backlog, PausedInfo, RoomRegistry, RoomState, PROTOCOL_VERSION};
pub use task::{
    effective_priority, format_task_id, task_number, Task, TaskAction, TaskStatus, TaskStatusKind,
};
pub use validate::{validate_agent_name, validate_priority, validate_resource, validate_task_id};
