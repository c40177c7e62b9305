// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port worker: one background thread per open port.
//!
//! The thread owns every connection of the port and runs a non-blocking
//! poll cycle: bookkeeping (accept / connect), drain the shared send queue,
//! receive and fan out, then sleep briefly if nothing moved. Endpoints talk to
//! it only through the shared queues in [`Shared`].

mod acceptor;
mod links;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hwb_wire::Telegram;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Mode, PortConfig};
use crate::connection::ConnectionId;
use crate::error::TransportError;
use crate::queue::{CountCallback, Inbox, SendQueue};

use self::acceptor::Source;
use self::links::{LinkSet, StepReport};

/// State shared between the worker thread and its endpoints.
pub(crate) struct Shared {
    pub config: PortConfig,
    pub outbound: SendQueue,
    inboxes: Mutex<Vec<Arc<Inbox>>>,
    connections: Mutex<Vec<ConnectionId>>,
    last_error: Mutex<Option<String>>,
    stop: AtomicBool,
    pub local_port: u16,
    pub max_datagram: Option<usize>,
}

impl Shared {
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.connections.lock().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn record_error(&self, error: String) {
        *self.last_error.lock() = Some(error);
    }

    fn inboxes(&self) -> Vec<Arc<Inbox>> {
        self.inboxes.lock().clone()
    }

    /// Every endpoint gets its own copy, in extraction order.
    fn deliver(&self, telegrams: &mut Vec<Telegram>) {
        let inboxes = self.inboxes();
        for inbox in &inboxes {
            for telegram in telegrams.iter() {
                inbox.push(telegram.clone());
            }
        }
        telegrams.clear();
        for inbox in &inboxes {
            inbox.notify();
        }
    }

    fn announce_newcomer(&self, id: ConnectionId) {
        for inbox in self.inboxes() {
            inbox.add_newcomer(id);
        }
    }

    /// Publish the live set; fire count callbacks (outside every lock) if its size changed.
    fn publish_connections(&self, ids: Vec<ConnectionId>) {
        let count = ids.len();
        let previous = std::mem::replace(&mut *self.connections.lock(), ids).len();
        if previous == count {
            return;
        }
        info!(port = self.local_port, connections = count, "connection count changed");
        let callbacks: Vec<CountCallback> =
            self.inboxes().iter().filter_map(|inbox| inbox.count_callback()).collect();
        for callback in callbacks {
            callback(count);
        }
    }
}

pub(crate) struct PortWorker {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PortWorker {
    /// Bind the port on the calling thread, then start the worker thread.
    pub fn start(config: PortConfig) -> Result<Self, TransportError> {
        let bound = Source::bind(&config)?;
        let mut links = LinkSet::new();
        let initial = bound.datagram.map(|socket| links.add(socket)).into_iter().collect();

        let shared = Arc::new(Shared {
            config,
            outbound: SendQueue::new(),
            inboxes: Mutex::new(Vec::new()),
            connections: Mutex::new(initial),
            last_error: Mutex::new(None),
            stop: AtomicBool::new(false),
            local_port: bound.local_port,
            max_datagram: bound.max_datagram,
        });

        let worker_shared = Arc::clone(&shared);
        let source = bound.source;
        let thread = thread::Builder::new()
            .name(format!("hwb-port-{}", shared.local_port))
            .spawn(move || run(&worker_shared, source, links))
            .map_err(TransportError::Spawn)?;

        Ok(Self { shared, thread: Mutex::new(Some(thread)) })
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub fn attach(&self, inbox: Arc<Inbox>) {
        self.shared.inboxes.lock().push(inbox);
    }

    /// Remove an endpoint's inbox; returns how many endpoints remain attached.
    pub fn detach(&self, inbox: &Arc<Inbox>) -> usize {
        let mut inboxes = self.shared.inboxes.lock();
        inboxes.retain(|other| !Arc::ptr_eq(other, inbox));
        inboxes.len()
    }

    /// Signal the thread to stop and wait for it to exit.
    ///
    /// Called from the worker thread itself (a callback closing its own
    /// endpoint) it only signals; the thread exits after the current cycle.
    pub fn stop_and_join(&self) {
        self.shared.stop.store(true, Ordering::Release);
        let Some(handle) = self.thread.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!(port = self.shared.local_port, "port worker thread panicked");
        }
    }
}

impl Drop for PortWorker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(shared: &Shared, mut source: Source, mut links: LinkSet) {
    let port = shared.local_port;
    let mode = shared.config.mode;
    info!(port, %mode, "port worker started");

    let mut inbound = Vec::new();
    let mut live = links.ids();

    while !shared.stop.load(Ordering::Acquire) {
        let mut progressed = bookkeeping(shared, &mut source, &mut links);

        let sent = links.pump_outbound(&shared.outbound);
        let received = links.receive_all(&mut inbound);
        for report in [sent, received] {
            progressed |= report.progressed;
            absorb(shared, &mut source, report);
        }

        if !inbound.is_empty() {
            shared.deliver(&mut inbound);
        }

        let ids = links.ids();
        if ids != live {
            live.clone_from(&ids);
            shared.publish_connections(ids);
        }

        idle();

        if !progressed {
            thread::sleep(shared.config.idle_sleep);
        }
    }

    links.clear();
    shared.publish_connections(Vec::new());
    info!(port, %mode, "port worker stopped");
}

/// Accept / connect step. Returns whether a connection was added.
fn bookkeeping(shared: &Shared, source: &mut Source, links: &mut LinkSet) -> bool {
    match source.poll(&shared.config, links.len()) {
        Ok(Some(socket)) => {
            let id = links.add(socket);
            debug!(port = shared.local_port, connection = id, "new connection");
            shared.announce_newcomer(id);
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!(port = shared.local_port, error = %e, "connection setup failed");
            shared.record_error(e.to_string());
            false
        }
    }
}

/// Record a step's errors; a dropped client link triggers a reconnect.
fn absorb(shared: &Shared, source: &mut Source, report: StepReport) {
    if !report.dropped.is_empty() {
        info!(port = shared.local_port, dropped = ?report.dropped, "connection closed");
        if shared.config.mode == Mode::TcpClient {
            source.invalidate();
        }
    }
    if let Some(error) = report.errors.into_iter().last() {
        shared.record_error(error);
    }
}

/// Reserved for periodic work; nothing runs here yet.
fn idle() {}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
