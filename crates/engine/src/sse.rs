// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fan-out to Server-Sent-Events subscribers.
//!
//! The HTTP transport registers one subscriber per `/events` connection
//! and removes it on disconnect. Broadcast iterates a snapshot of the
//! subscriber set; a subscriber whose channel is full or closed is
//! detached rather than blocking the publisher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

const SUBSCRIBER_BUFFER: usize = 64;

/// An event frame: `(event name, payload)`.
pub type SseFrame = (String, Value);

struct Subscriber {
    /// `None` receives everything; `Some(name)` only that event type.
    filter: Option<String>,
    tx: mpsc::Sender<SseFrame>,
}

#[derive(Default)]
pub struct SseHub {
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

impl SseHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; returns its id and the frame receiver.
    pub fn subscribe(&self, filter: Option<String>) -> (u64, mpsc::Receiver<SseFrame>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, Subscriber { filter, tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Push a frame to every matching subscriber. Failed sends detach the
    /// subscriber.
    pub fn broadcast(&self, event: &str, payload: &Value) {
        let snapshot: Vec<(u64, Option<String>, mpsc::Sender<SseFrame>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, s)| (*id, s.filter.clone(), s.tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, filter, tx) in snapshot {
            if filter.as_deref().is_some_and(|f| f != event) {
                continue;
            }
            if tx.try_send((event.to_string(), payload.clone())).is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.subscribers.lock();
            for id in dead {
                debug!(subscriber = id, "detaching unreachable SSE subscriber");
                subscribers.remove(&id);
            }
        }
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
