// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver capability interface and the built-in backends.
//!
//! Real device drivers live outside this crate and plug in by implementing
//! [`Driver`]. Every operation takes the inbound message and returns the
//! reply message; the host sends it back under the request's id.

use std::f64::consts::TAU;

use hwb_wire::Message;
use serde_json::json;
use thiserror::Error;

use crate::config::{Backend, DriverConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    #[error("driver is not initialized")]
    NotInitialized,

    #[error("no device detected")]
    NoDevice,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("device error: {0}")]
    Device(String),
}

pub trait Driver: Send {
    fn name(&self) -> &str;

    fn hardware_detect(&mut self, request: &Message) -> Result<Message, DriverError>;

    fn config_detect(&mut self, request: &Message) -> Result<Message, DriverError>;

    /// Prepare to run at `frequency_hz` ticks per second.
    fn check_initialize(&mut self, frequency_hz: f64, request: &Message) -> Result<Message, DriverError>;

    /// One tick. Appends any samples produced to `samples`; returns whether
    /// the driver wants to keep running.
    fn run(&mut self, samples: &mut Vec<f64>) -> Result<bool, DriverError>;

    fn shutdown(&mut self, request: &Message) -> Result<Message, DriverError>;
}

/// Build the backend selected in the config.
pub fn create_driver(config: &DriverConfig) -> Box<dyn Driver> {
    match config.backend {
        Backend::Simulated => Box::new(SimulatedDriver::new(config.channels)),
        Backend::Null => Box::new(NullDriver),
    }
}

/// Synthetic device: one sine wave per channel, phase-shifted.
#[derive(Debug)]
pub struct SimulatedDriver {
    channels: usize,
    frequency_hz: Option<f64>,
    tick: u64,
}

const SIMULATED_SERIAL: &str = "SIM-0001";

/// Period of the simulated signal.
const SIGNAL_HZ: f64 = 1.0;

impl SimulatedDriver {
    pub fn new(channels: usize) -> Self {
        Self { channels, frequency_hz: None, tick: 0 }
    }

    pub fn is_initialized(&self) -> bool {
        self.frequency_hz.is_some()
    }
}

impl Driver for SimulatedDriver {
    fn name(&self) -> &str {
        "simulated"
    }

    fn hardware_detect(&mut self, request: &Message) -> Result<Message, DriverError> {
        Ok(Message::new(
            request.id(),
            json!({ "devices": [{ "name": self.name(), "serial": SIMULATED_SERIAL }] }),
        ))
    }

    fn config_detect(&mut self, request: &Message) -> Result<Message, DriverError> {
        let channels: Vec<_> = (0..self.channels).map(|i| format!("ch{}", i)).collect();
        Ok(Message::new(
            request.id(),
            json!({ "serial": SIMULATED_SERIAL, "channels": channels }),
        ))
    }

    fn check_initialize(&mut self, frequency_hz: f64, request: &Message) -> Result<Message, DriverError> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(DriverError::InvalidParam {
                name: "frequency",
                reason: format!("{} is not a positive rate", frequency_hz),
            });
        }
        self.frequency_hz = Some(frequency_hz);
        self.tick = 0;
        Ok(Message::new(request.id(), json!({ "initialized": true, "frequency": frequency_hz })))
    }

    fn run(&mut self, samples: &mut Vec<f64>) -> Result<bool, DriverError> {
        let frequency = self.frequency_hz.ok_or(DriverError::NotInitialized)?;
        let t = self.tick as f64 / frequency;
        let channels = self.channels.max(1) as f64;
        samples.extend((0..self.channels).map(|ch| {
            let phase = TAU * ch as f64 / channels;
            (TAU * SIGNAL_HZ * t + phase).sin()
        }));
        self.tick += 1;
        Ok(true)
    }

    fn shutdown(&mut self, request: &Message) -> Result<Message, DriverError> {
        self.frequency_hz = None;
        Ok(Message::new(request.id(), json!({ "ticks": self.tick })))
    }
}

/// Backend for hosts without hardware.
#[derive(Debug, Default)]
pub struct NullDriver;

impl Driver for NullDriver {
    fn name(&self) -> &str {
        "null"
    }

    fn hardware_detect(&mut self, request: &Message) -> Result<Message, DriverError> {
        Ok(Message::new(request.id(), json!({ "devices": [] })))
    }

    fn config_detect(&mut self, _request: &Message) -> Result<Message, DriverError> {
        Err(DriverError::NoDevice)
    }

    fn check_initialize(&mut self, _frequency_hz: f64, _request: &Message) -> Result<Message, DriverError> {
        Err(DriverError::NoDevice)
    }

    fn run(&mut self, _samples: &mut Vec<f64>) -> Result<bool, DriverError> {
        Ok(false)
    }

    fn shutdown(&mut self, request: &Message) -> Result<Message, DriverError> {
        Ok(Message::empty(request.id()))
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
