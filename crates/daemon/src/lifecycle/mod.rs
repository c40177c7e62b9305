// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, run, shutdown.

mod startup;
pub use startup::startup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hwb_messaging::{MessageResponder, PumpReport, Subscription};
use hwb_transport::{Endpoint, TransportError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::host::DriverHost;

/// Why [`Daemon::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C / SIGINT
    Signal,
    /// A peer sent the `shutdown` message
    ShutdownMessage,
    /// [`Daemon::stop_token`] was cancelled
    Requested,
}

/// Running daemon state.
pub struct Daemon {
    /// Configuration
    pub config: Config,
    endpoint: Arc<Endpoint>,
    responder: MessageResponder,
    host: DriverHost,
    // NOTE(lifetime): handlers stay subscribed while these live
    _subscriptions: Vec<Subscription>,
    stop: CancellationToken,
    /// Cancels the background tasks
    tasks_cancel: CancellationToken,
    serve: Option<JoinHandle<Result<PumpReport, TransportError>>>,
    ticker: Option<JoinHandle<()>>,
    /// When daemon started
    pub start_time: Instant,
}

impl Daemon {
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    pub fn responder(&self) -> &MessageResponder {
        &self.responder
    }

    pub fn host(&self) -> &DriverHost {
        &self.host
    }

    /// Bound port, useful when the config asked for port 0.
    pub fn local_port(&self) -> Option<u16> {
        self.endpoint.local_port()
    }

    /// Cancel to make [`Daemon::run`] return.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Serve messages and tick the driver until a stop condition.
    ///
    /// Returns an error when the message pump fails; call
    /// [`Daemon::shutdown`] afterwards in every case.
    pub async fn run(&mut self) -> Result<StopReason, LifecycleError> {
        let mut serve = tokio::spawn(hwb_messaging::serve(
            Arc::clone(&self.endpoint),
            self.responder.clone(),
            self.tasks_cancel.clone(),
        ));
        self.ticker = Some(tokio::spawn(self.host.clone().run(self.tasks_cancel.clone())));
        let shutdown_message = self.host.shutdown_requested();

        info!(port = ?self.endpoint.local_port(), "daemon running");
        let outcome = tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| StopReason::Signal).map_err(LifecycleError::from),
            _ = shutdown_message.cancelled() => Ok(StopReason::ShutdownMessage),
            _ = self.stop.cancelled() => Ok(StopReason::Requested),
            finished = &mut serve => Err(pump_exit(finished)),
        };
        match &outcome {
            Ok(reason) => {
                info!(?reason, "stopping daemon");
                self.serve = Some(serve);
            }
            Err(e) => warn!(error = %e, "message pump exited"),
        }
        outcome
    }

    /// Stop background tasks, flush queued replies, and close the endpoint.
    ///
    /// The endpoint close is synchronous: the port is free once this returns.
    pub async fn shutdown(mut self, timeout: Duration) {
        info!("shutting down daemon...");
        let deadline = tokio::time::Instant::now() + timeout;

        self.tasks_cancel.cancel();
        if let Some(ticker) = self.ticker.take() {
            if tokio::time::timeout_at(deadline, ticker).await.is_err() {
                warn!("driver ticker did not stop in time");
            }
        }
        if let Some(serve) = self.serve.take() {
            match tokio::time::timeout_at(deadline, serve).await {
                Ok(Ok(Ok(report))) => info!(dispatched = report.dispatched, "message pump stopped"),
                Ok(Ok(Err(e))) => warn!(error = %e, "message pump failed"),
                Ok(Err(e)) => warn!(error = %e, "message pump task panicked"),
                Err(_) => warn!("message pump did not stop in time"),
            }
        }

        // Replies to the last requests (e.g. `shutdown`) are still queued
        while self.endpoint.send_queue_len() > 0 && self.endpoint.connection_count() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(queued = self.endpoint.send_queue_len(), "dropping unsent telegrams");
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        self.responder.clear_send_function();
        self.endpoint.close();
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "daemon stopped");
    }
}

fn pump_exit(finished: Result<Result<PumpReport, TransportError>, tokio::task::JoinError>) -> LifecycleError {
    match finished {
        Ok(Ok(report)) => {
            LifecycleError::Runtime(format!("message pump exited after {} messages", report.dispatched))
        }
        Ok(Err(e)) => LifecycleError::Transport(e),
        Err(e) => LifecycleError::Runtime(e.to_string()),
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to open port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: TransportError,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("log file path has no file name: {}", .0.display())]
    LogFile(PathBuf),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("runtime error: {0}")]
    Runtime(String),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
