// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hardware bridge daemon library
//!
//! Configuration, logging, the driver capability interface and the
//! lifecycle used by the `hwbd` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod driver;
pub mod env;
pub mod host;
pub mod lifecycle;
pub mod logging;

pub use config::{Backend, Config, ConfigError, DriverConfig, LogConfig};
pub use driver::{create_driver, Driver, DriverError, NullDriver, SimulatedDriver};
pub use host::DriverHost;
pub use lifecycle::{startup, Daemon, LifecycleError, StopReason};
