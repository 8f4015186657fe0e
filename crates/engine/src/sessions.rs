// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory session registry: per-agent mailboxes, listening flags, and
//! rate buckets.
//!
//! The registry map sits behind one `parking_lot` mutex; a `tokio::sync::
//! Notify` signalled by [`SessionRegistry::push_message`] wakes blocked
//! `wait_for_message` callers without polling CPU.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use masc_core::{Clock, Message, RoomError};

use crate::ratelimit::{Bucket, RateCategory, RateDecision, Role};

const MAILBOX_CAP: usize = 256;

struct SessionEntry {
    mailbox: VecDeque<Message>,
    listening: bool,
    buckets: HashMap<RateCategory, Bucket>,
    last_activity: DateTime<Utc>,
}

impl SessionEntry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            mailbox: VecDeque::new(),
            listening: false,
            buckets: HashMap::new(),
            last_activity: now,
        }
    }
}

/// Ephemeral per-room agent state. Persisted agent records live in the
/// store; everything here dies with the process.
pub struct SessionRegistry<C: Clock> {
    inner: Mutex<HashMap<String, SessionEntry>>,
    notify: Arc<Notify>,
    clock: C,
}

impl<C: Clock> SessionRegistry<C> {
    pub fn new(clock: C) -> Self {
        Self { inner: Mutex::new(HashMap::new()), notify: Arc::new(Notify::new()), clock }
    }

    /// Idempotent: re-registering keeps the existing mailbox.
    pub fn register(&self, name: &str) {
        let now = self.clock.now();
        self.inner
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| SessionEntry::new(now));
    }

    /// Idempotent: unregistering an absent agent is a no-op.
    pub fn unregister(&self, name: &str) {
        self.inner.lock().remove(name);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.lock().contains_key(name)
    }

    pub fn is_listening(&self, name: &str) -> bool {
        self.inner.lock().get(name).map(|e| e.listening).unwrap_or(false)
    }

    /// Deliver a message: to the mentioned agent's mailbox only, or to
    /// every registered mailbox except the sender's on a broadcast.
    /// A full mailbox drops the oldest entry first.
    pub fn push_message(&self, message: &Message) {
        let mut inner = self.inner.lock();
        match &message.mention {
            Some(target) => {
                if let Some(entry) = inner.get_mut(target) {
                    Self::enqueue(entry, message.clone());
                }
            }
            None => {
                for (name, entry) in inner.iter_mut() {
                    if *name != message.from_agent {
                        Self::enqueue(entry, message.clone());
                    }
                }
            }
        }
        drop(inner);
        self.notify.notify_waiters();
    }

    fn enqueue(entry: &mut SessionEntry, message: Message) {
        if entry.mailbox.len() >= MAILBOX_CAP {
            entry.mailbox.pop_front();
        }
        entry.mailbox.push_back(message);
    }

    /// Non-blocking FIFO dequeue.
    pub fn pop_message(&self, name: &str) -> Option<Message> {
        self.inner.lock().get_mut(name)?.mailbox.pop_front()
    }

    /// Block until a message arrives, the timeout lapses (`Ok(None)`), or
    /// `cancel` fires (`Err(Cancelled)`). `timeout_s == 0` returns
    /// immediately. While waiting the agent reads as listening; the flag
    /// is restored on every exit path.
    pub async fn wait_for_message(
        &self,
        name: &str,
        timeout_s: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<Message>, RoomError> {
        if let Some(message) = self.pop_message(name) {
            return Ok(Some(message));
        }
        if timeout_s == 0 {
            return Ok(None);
        }

        self.set_listening(name, true);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_s);
        let result = loop {
            // Arm the wakeup before re-checking the mailbox so a push
            // between the check and the await is not lost.
            let notified = self.notify.notified();
            if let Some(message) = self.pop_message(name) {
                break Ok(Some(message));
            }
            tokio::select! {
                _ = notified => continue,
                _ = cancel.cancelled() => break Err(RoomError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => break Ok(None),
            }
        };
        self.set_listening(name, false);
        trace!(agent = name, hit = result.as_ref().map(|m| m.is_some()).unwrap_or(false), "wait_for_message done");
        result
    }

    fn set_listening(&self, name: &str, listening: bool) {
        if let Some(entry) = self.inner.lock().get_mut(name) {
            entry.listening = listening;
        }
    }

    /// Token-bucket admission check; refusal carries a retry hint.
    pub fn check_rate_limit(
        &self,
        name: &str,
        category: RateCategory,
        role: Role,
    ) -> RateDecision {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let entry = inner.entry(name.to_string()).or_insert_with(|| SessionEntry::new(now));
        entry.last_activity = now;
        let bucket = entry
            .buckets
            .entry(category)
            .or_insert_with(|| Bucket::new(category, role, now));
        bucket.check(category, role, now)
    }

    /// Names with undelivered mail (for status displays).
    pub fn pending_counts(&self) -> HashMap<String, usize> {
        self.inner
            .lock()
            .iter()
            .filter(|(_, e)| !e.mailbox.is_empty())
            .map(|(name, e)| (name.clone(), e.mailbox.len()))
            .collect()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
