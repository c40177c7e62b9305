// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Communication endpoint: the application-facing handle on a port.
//!
//! Every method takes `&self` and is safe to call from any thread, so an
//! endpoint is usually shared as `Arc<Endpoint>` between the code that sends
//! and the code that receives.

use std::sync::Arc;

use hwb_wire::{CodeFilter, Telegram};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::PortConfig;
use crate::connection::ConnectionId;
use crate::error::TransportError;
use crate::queue::{Inbox, Outbound, Target};
use crate::registry::{PortRegistry, WorkerKey};
use crate::worker::{PortWorker, Shared};

struct Attached {
    key: WorkerKey,
    worker: Arc<PortWorker>,
}

pub struct Endpoint {
    registry: PortRegistry,
    inbox: Arc<Inbox>,
    attached: Mutex<Option<Attached>>,
}

impl Endpoint {
    pub fn new(registry: &PortRegistry) -> Self {
        Self { registry: registry.clone(), inbox: Arc::new(Inbox::default()), attached: Mutex::new(None) }
    }

    /// Attach to the port worker for `config`, starting it if none runs yet.
    ///
    /// Closes first, so reopening with a different config is allowed. Bind
    /// failures are returned here; nothing is retried in the background.
    pub fn open(&self, config: PortConfig) -> Result<(), TransportError> {
        self.close();
        let (key, worker) = self.registry.attach(config, Arc::clone(&self.inbox))?;
        debug!(mode = %key.mode, port = key.port, "endpoint opened");
        *self.attached.lock() = Some(Attached { key, worker });
        Ok(())
    }

    /// Detach from the worker. If this was the last endpoint on the port, the
    /// worker is stopped and joined before this returns.
    pub fn close(&self) {
        let Some(attached) = self.attached.lock().take() else {
            return;
        };
        self.registry.detach(&attached.key, &attached.worker, &self.inbox);
        self.inbox.clear();
        // Wake pending `recv` calls so they observe the close
        self.inbox.notify();
        debug!(mode = %attached.key.mode, port = attached.key.port, "endpoint closed");
    }

    pub fn is_open(&self) -> bool {
        self.attached.lock().is_some()
    }

    /// Port the worker actually serves (the bound port when opened with 0).
    pub fn local_port(&self) -> Option<u16> {
        self.with_shared(|shared| shared.local_port)
    }

    /// Datagram size limit of a udp endpoint.
    pub fn max_datagram(&self) -> Option<usize> {
        self.with_shared(|shared| shared.max_datagram).flatten()
    }

    /// Queue `telegram` for every live connection of the port.
    pub fn push_send(&self, telegram: Telegram) -> Result<(), TransportError> {
        self.enqueue(telegram, Target::All)
    }

    /// Queue `telegram` for one connection only.
    pub fn push_send_to(&self, id: ConnectionId, telegram: Telegram) -> Result<(), TransportError> {
        if !self.connections().contains(&id) {
            return Err(TransportError::UnknownConnection(id));
        }
        self.enqueue(telegram, Target::Connection(id))
    }

    fn enqueue(&self, telegram: Telegram, target: Target) -> Result<(), TransportError> {
        let shared = self.shared().ok_or(TransportError::NotOpen)?;
        if let Some(max) = shared.max_datagram {
            telegram.check_datagram(max)?;
        }
        shared.outbound.push(Outbound::new(telegram, target));
        Ok(())
    }

    /// Oldest received telegram matching `filter`; non-matching ones stay queued.
    pub fn pop_receive(&self, filter: CodeFilter) -> Option<Telegram> {
        self.inbox.pop(filter)
    }

    /// Newest received telegram; everything older is discarded.
    pub fn get_last_receive(&self) -> Option<Telegram> {
        self.inbox.pop_latest()
    }

    /// Wait for the next telegram matching `filter`.
    ///
    /// Fails with [`TransportError::NotOpen`] if the endpoint is (or gets) closed.
    pub async fn recv(&self, filter: CodeFilter) -> Result<Telegram, TransportError> {
        loop {
            let notified = self.inbox.arrived().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(telegram) = self.inbox.pop(filter) {
                return Ok(telegram);
            }
            if !self.is_open() {
                return Err(TransportError::NotOpen);
            }
            notified.await;
        }
    }

    /// Telegrams waiting in this endpoint's receive queue.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Connections accepted or established since the last call.
    pub fn take_newcomers(&self) -> Vec<ConnectionId> {
        self.inbox.take_newcomers()
    }

    /// Called from the worker thread with the new live-connection count.
    pub fn on_connection_count<F>(&self, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.inbox.set_count_callback(Some(Arc::new(callback)));
    }

    pub fn clear_connection_count_callback(&self) {
        self.inbox.set_count_callback(None);
    }

    pub fn connections(&self) -> Vec<ConnectionId> {
        self.with_shared(|shared| shared.connections()).unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }

    /// Most recent transport error recorded by the port worker.
    pub fn last_error(&self) -> Option<String> {
        self.with_shared(|shared| shared.last_error()).flatten()
    }

    /// Telegrams not yet fully transmitted on this port.
    pub fn send_queue_len(&self) -> usize {
        self.with_shared(|shared| shared.outbound.len()).unwrap_or(0)
    }

    fn shared(&self) -> Option<Arc<Shared>> {
        self.attached.lock().as_ref().map(|a| Arc::clone(a.worker.shared()))
    }

    fn with_shared<T>(&self, f: impl FnOnce(&Shared) -> T) -> Option<T> {
        self.shared().map(|shared| f(&shared))
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attached = self.attached.lock();
        f.debug_struct("Endpoint")
            .field("key", &attached.as_ref().map(|a| &a.key))
            .field("pending", &self.inbox.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
