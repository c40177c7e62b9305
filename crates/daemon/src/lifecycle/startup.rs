// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;
use std::time::Instant;

use hwb_messaging::{endpoint_sender, MessageResponder};
use hwb_transport::{PortRegistry, TelegramCode};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::driver::create_driver;
use crate::host::DriverHost;

use super::{Daemon, LifecycleError};

/// Open the endpoint, wire the responder to it and install the driver host.
///
/// The port is bound before this returns; a bind failure aborts startup.
pub fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let registry = PortRegistry::new();
    let endpoint = Arc::new(registry.endpoint());
    endpoint
        .open(config.transport.clone())
        .map_err(|source| LifecycleError::Bind { port: config.transport.port, source })?;

    let responder = MessageResponder::new();
    responder.set_send_function(endpoint_sender(Arc::clone(&endpoint), TelegramCode::Command));

    let driver = create_driver(&config.driver);
    info!(
        mode = %config.transport.mode,
        port = ?endpoint.local_port(),
        driver = driver.name(),
        "daemon started"
    );
    let host = DriverHost::new(driver, Arc::clone(&endpoint), config.driver.frequency_hz);
    let subscriptions = host.install(&responder);

    Ok(Daemon {
        config: config.clone(),
        endpoint,
        responder,
        host,
        _subscriptions: subscriptions,
        stop: CancellationToken::new(),
        tasks_cancel: CancellationToken::new(),
        serve: None,
        ticker: None,
        start_time: Instant::now(),
    })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
