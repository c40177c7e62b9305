// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hwbd`: serves the driver messages on the configured port until Ctrl-C
//! or a `shutdown` message.

use std::process::ExitCode;

use hwb_daemon::{env, logging, startup, Config, LifecycleError};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon failed");
            eprintln!("hwbd: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::resolve()?;
    let _guard = logging::init(&config.log)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting hwbd");

    let mut daemon = startup(&config)?;
    let outcome = daemon.run().await;
    daemon.shutdown(env::shutdown_timeout()).await;
    outcome.map(|_| ())
}
