// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! masc-engine: the room coordination engine.
//!
//! A per-room [`Coordinator`] owns the persistent store, the in-memory
//! session registry, the lock manager, the planning store, and the event
//! bus. Handlers receive the coordinator by reference; nothing here is a
//! global.

pub mod coordinator;
pub mod events;
pub mod gc;
pub mod locks;
pub mod planning;
pub mod ratelimit;
pub mod sessions;
pub mod sse;
pub mod tasks;

pub use coordinator::{AgentStatusEntry, Coordinator, JoinRequest, RoomConfig};
pub use events::EventBus;
pub use gc::GcReport;
pub use locks::LockManager;
pub use planning::PlanningStore;
pub use ratelimit::{RateCategory, RateDecision, Role};
pub use sessions::SessionRegistry;
pub use sse::SseHub;
pub use tasks::{NewTask, TaskEngine, TransitionOutcome};
