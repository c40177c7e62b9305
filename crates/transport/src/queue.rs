// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFOs shared between application threads and a port worker.
//!
//! Locks are held only to move items in or out; callbacks and socket I/O
//! always run after the guard is released.

use std::collections::VecDeque;
use std::sync::Arc;

use hwb_wire::{CodeFilter, Telegram};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::connection::ConnectionId;

/// Which live connections an outbound telegram goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Connection(ConnectionId),
}

impl Target {
    pub fn includes(self, id: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::Connection(wanted) => wanted == id,
        }
    }
}

/// Queued outbound telegram.
///
/// The telegram sits behind an `Arc` so the worker can read the head of the
/// queue without copying it or holding the lock while it writes.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub telegram: Arc<Telegram>,
    pub target: Target,
}

impl Outbound {
    pub fn new(telegram: Telegram, target: Target) -> Self {
        Self { telegram: Arc::new(telegram), target }
    }
}

/// Outbound FIFO of one port worker.
#[derive(Debug, Default)]
pub struct SendQueue {
    items: Mutex<VecDeque<Outbound>>,
}

impl SendQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: Outbound) {
        self.items.lock().push_back(item);
    }

    /// Head of the queue, left in place.
    pub fn front(&self) -> Option<Outbound> {
        self.items.lock().front().cloned()
    }

    pub fn pop_front(&self) -> Option<Outbound> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}

/// Callback fired with the new number of live connections.
pub type CountCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Per-endpoint receive side: its own copy of every inbound telegram.
#[derive(Default)]
pub(crate) struct Inbox {
    received: Mutex<VecDeque<Telegram>>,
    newcomers: Mutex<Vec<ConnectionId>>,
    on_count: Mutex<Option<CountCallback>>,
    arrived: Notify,
}

impl Inbox {
    pub fn push(&self, telegram: Telegram) {
        self.received.lock().push_back(telegram);
    }

    pub fn notify(&self) {
        self.arrived.notify_waiters();
    }

    pub fn arrived(&self) -> &Notify {
        &self.arrived
    }

    /// Oldest telegram matching `filter`; others keep their place.
    pub fn pop(&self, filter: CodeFilter) -> Option<Telegram> {
        let mut received = self.received.lock();
        let index = received.iter().position(|t| filter.matches(t.code()))?;
        received.remove(index)
    }

    /// Newest telegram; everything older is discarded.
    pub fn pop_latest(&self) -> Option<Telegram> {
        let mut received = self.received.lock();
        let latest = received.pop_back();
        received.clear();
        latest
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn add_newcomer(&self, id: ConnectionId) {
        self.newcomers.lock().push(id);
    }

    pub fn take_newcomers(&self) -> Vec<ConnectionId> {
        std::mem::take(&mut *self.newcomers.lock())
    }

    pub fn set_count_callback(&self, callback: Option<CountCallback>) {
        *self.on_count.lock() = callback;
    }

    pub fn count_callback(&self) -> Option<CountCallback> {
        self.on_count.lock().clone()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
        self.newcomers.lock().clear();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
