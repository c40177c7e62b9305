// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port registry: which port worker serves which port.
//!
//! A worker is created by the first endpoint opening its port and stopped when
//! the last one closes. The registry is an explicit handle; endpoints that
//! should share ports must be created from clones of the same registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{Mode, PortConfig};
use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::queue::Inbox;
use crate::worker::PortWorker;

/// Registry key. Client workers are keyed by their remote address, server and
/// udp workers by the bound local port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerKey {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
}

impl WorkerKey {
    fn new(config: &PortConfig, port: u16) -> Self {
        let host = match config.mode {
            Mode::TcpClient => config.host.clone(),
            Mode::TcpServer | Mode::Udp => String::new(),
        };
        Self { mode: config.mode, host, port }
    }
}

#[derive(Clone, Default)]
pub struct PortRegistry {
    workers: Arc<Mutex<HashMap<WorkerKey, Arc<PortWorker>>>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed endpoint bound to this registry.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self)
    }

    /// Number of running port workers.
    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().is_empty()
    }

    /// Attach `inbox` to the worker for `config`, starting one if needed.
    ///
    /// Port 0 always starts a new worker on an ephemeral port.
    pub(crate) fn attach(
        &self,
        config: PortConfig,
        inbox: Arc<Inbox>,
    ) -> Result<(WorkerKey, Arc<PortWorker>), TransportError> {
        let mut workers = self.workers.lock();

        if config.port != 0 {
            let requested = WorkerKey::new(&config, config.port);
            if let Some(worker) = workers.get(&requested) {
                debug!(mode = %config.mode, port = config.port, "attaching to running port worker");
                worker.attach(inbox);
                return Ok((requested, Arc::clone(worker)));
            }
        }

        let worker = Arc::new(PortWorker::start(config)?);
        let shared = worker.shared();
        let key = WorkerKey::new(&shared.config, shared.local_port);
        worker.attach(inbox);
        workers.insert(key.clone(), Arc::clone(&worker));
        info!(mode = %key.mode, port = key.port, "port worker registered");
        Ok((key, worker))
    }

    /// Detach `inbox`; the last endpoint out stops the worker and waits for it.
    ///
    /// The join happens after the registry lock is released so a worker
    /// callback that closes another endpoint cannot deadlock against it.
    pub(crate) fn detach(&self, key: &WorkerKey, worker: &Arc<PortWorker>, inbox: &Arc<Inbox>) {
        {
            let mut workers = self.workers.lock();
            if worker.detach(inbox) > 0 {
                return;
            }
            if workers.get(key).is_some_and(|w| Arc::ptr_eq(w, worker)) {
                workers.remove(key);
            }
        }
        info!(mode = %key.mode, port = key.port, "stopping port worker");
        worker.stop_and_join();
    }
}

impl std::fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let workers = self.workers.lock();
        f.debug_struct("PortRegistry").field("workers", &workers.keys().collect::<Vec<_>>()).finish()
    }
}
