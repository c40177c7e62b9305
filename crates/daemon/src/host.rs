// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver host: routes driver messages to the selected backend and ticks it.
//!
//! The four driver message ids are answered on the responder. While the
//! backend is initialized, [`DriverHost::run`] calls `Driver::run` at the
//! requested frequency and publishes each tick's samples as a double-array
//! telegram to every peer on the endpoint.

use std::sync::Arc;
use std::time::Duration;

use hwb_messaging::{MessageResponder, Subscription};
use hwb_transport::Endpoint;
use hwb_wire::{Message, Telegram};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::{Driver, DriverError};

pub const HARDWARE_DETECT: &str = "hardwaredetect";
pub const CONFIG_DETECT: &str = "configdetect";
pub const CHECK_INITIALIZE: &str = "checkinitialize";
pub const SHUTDOWN: &str = "shutdown";

struct HostState {
    driver: Box<dyn Driver>,
    /// Tick rate while initialized
    frequency_hz: Option<f64>,
    ticks: u64,
}

struct Shared {
    state: Mutex<HostState>,
    endpoint: Arc<Endpoint>,
    default_frequency_hz: f64,
    /// Woken when the tick rate changes
    rate_changed: Notify,
    /// Fired by a `shutdown` message
    shutdown: CancellationToken,
}

#[derive(Clone)]
pub struct DriverHost {
    shared: Arc<Shared>,
}

impl DriverHost {
    pub fn new(driver: Box<dyn Driver>, endpoint: Arc<Endpoint>, default_frequency_hz: f64) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(HostState { driver, frequency_hz: None, ticks: 0 }),
                endpoint,
                default_frequency_hz,
                rate_changed: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Subscribe the driver message ids. Handlers stay registered while the
    /// returned subscriptions live.
    pub fn install(&self, responder: &MessageResponder) -> Vec<Subscription> {
        let ids = [HARDWARE_DETECT, CONFIG_DETECT, CHECK_INITIALIZE, SHUTDOWN];
        ids.into_iter()
            .map(|id| {
                let host = self.clone();
                responder.subscribe(id, move |message| Some(host.handle(message)))
            })
            .collect()
    }

    /// Answer one driver message. Backend failures become an `error` param.
    pub fn handle(&self, request: &Message) -> Message {
        let result = match request.id() {
            HARDWARE_DETECT => self.shared.state.lock().driver.hardware_detect(request),
            CONFIG_DETECT => self.shared.state.lock().driver.config_detect(request),
            CHECK_INITIALIZE => self.initialize(request),
            SHUTDOWN => self.shutdown_driver(request),
            other => Err(DriverError::Device(format!("unsupported message {}", other))),
        };
        match result {
            Ok(mut reply) => {
                reply.set_id(request.id());
                reply
            }
            Err(e) => {
                warn!(id = %request.id(), error = %e, "driver request failed");
                Message::empty(request.id()).with_param("error", e.to_string())
            }
        }
    }

    fn initialize(&self, request: &Message) -> Result<Message, DriverError> {
        let frequency_hz = match request.param("frequency") {
            None => self.shared.default_frequency_hz,
            Some(value) => value.as_f64().ok_or_else(|| DriverError::InvalidParam {
                name: "frequency",
                reason: format!("expected a number, got {}", value),
            })?,
        };
        tick_period(frequency_hz)?;
        let reply = {
            let mut state = self.shared.state.lock();
            let reply = state.driver.check_initialize(frequency_hz, request)?;
            state.frequency_hz = Some(frequency_hz);
            reply
        };
        info!(frequency_hz, "driver initialized");
        self.shared.rate_changed.notify_waiters();
        Ok(reply)
    }

    fn shutdown_driver(&self, request: &Message) -> Result<Message, DriverError> {
        let reply = {
            let mut state = self.shared.state.lock();
            state.frequency_hz = None;
            state.driver.shutdown(request)
        };
        self.shared.rate_changed.notify_waiters();
        self.shared.shutdown.cancel();
        reply
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().frequency_hz.is_some()
    }

    pub fn ticks(&self) -> u64 {
        self.shared.state.lock().ticks
    }

    /// Token fired once a `shutdown` message has been handled.
    pub fn shutdown_requested(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Run one driver tick and publish its samples.
    ///
    /// Returns whether the driver keeps running. A driver that stops or
    /// fails leaves the initialized state.
    pub fn tick(&self) -> Result<bool, DriverError> {
        let mut samples = Vec::new();
        let outcome = {
            let mut state = self.shared.state.lock();
            let outcome = state.driver.run(&mut samples);
            state.ticks += 1;
            if !matches!(outcome, Ok(true)) {
                state.frequency_hz = None;
            }
            outcome
        };

        if !samples.is_empty() {
            let published = Telegram::doubles(&samples)
                .map_err(hwb_transport::TransportError::from)
                .and_then(|telegram| self.shared.endpoint.push_send(telegram));
            if let Err(e) = published {
                warn!(samples = samples.len(), error = %e, "samples not published");
            }
        }
        outcome
    }

    fn period(&self) -> Option<Duration> {
        self.shared.state.lock().frequency_hz.and_then(|hz| tick_period(hz).ok())
    }

    /// Tick the driver at its rate until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            let changed = self.shared.rate_changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let wait = match self.period() {
                Some(period) => period,
                // Idle until initialized
                None => Duration::MAX,
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = &mut changed => continue,
                _ = sleep_or_park(wait) => {}
            }
            match self.tick() {
                Ok(true) => {}
                Ok(false) => info!(ticks = self.ticks(), "driver stopped running"),
                Err(e) => warn!(error = %e, "driver tick failed"),
            }
        }
        debug!(ticks = self.ticks(), "driver host stopped");
    }
}

/// Interval between ticks at `frequency_hz`; must be representable and non-zero.
fn tick_period(frequency_hz: f64) -> Result<Duration, DriverError> {
    Duration::try_from_secs_f64(1.0 / frequency_hz)
        .ok()
        .filter(|period| !period.is_zero() && *period < Duration::MAX)
        .ok_or_else(|| DriverError::InvalidParam {
            name: "frequency",
            reason: format!("{} Hz has no usable tick period", frequency_hz),
        })
}

async fn sleep_or_park(wait: Duration) {
    if wait == Duration::MAX {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(wait).await;
    }
}

impl std::fmt::Debug for DriverHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("DriverHost")
            .field("driver", &state.driver.name())
            .field("frequency_hz", &state.frequency_hz)
            .field("ticks", &state.ticks)
            .finish()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
