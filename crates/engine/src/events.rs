// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit log append + SSE fan-out.
//!
//! An emitted event follows, in wall-clock order, the state mutation that
//! produced it: callers mutate first, then emit.

use std::sync::Arc;

use tracing::warn;

use masc_core::{AuditEvent, Clock, RoomError};
use masc_store::RoomStore;

use crate::sse::SseHub;

pub struct EventBus<C: Clock> {
    store: RoomStore,
    hub: Arc<SseHub>,
    audit_enabled: bool,
    clock: C,
}

impl<C: Clock> EventBus<C> {
    pub fn new(store: RoomStore, hub: Arc<SseHub>, audit_enabled: bool, clock: C) -> Self {
        Self { store, hub, audit_enabled, clock }
    }

    pub fn hub(&self) -> &Arc<SseHub> {
        &self.hub
    }

    /// Append one audit line (iff auditing is enabled) and push the event
    /// to SSE subscribers. Audit write failures are logged, not fatal:
    /// the state mutation already happened.
    pub fn emit(
        &self,
        agent: &str,
        event_type: &str,
        success: bool,
        detail: Option<String>,
    ) -> AuditEvent {
        let event = AuditEvent::new(self.clock.now(), agent, event_type, success, detail);
        if self.audit_enabled {
            if let Err(e) = self.store.append_audit(&event) {
                warn!(error = %e, "failed to append audit event");
            }
        }
        match serde_json::to_value(&event) {
            Ok(payload) => self.hub.broadcast(event_type, &payload),
            Err(e) => warn!(error = %e, "failed to serialize audit event"),
        }
        event
    }

    /// Recent audit events, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, RoomError> {
        self.store.read_audit(limit)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
