// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration file path (`HWB_CONFIG`)
pub fn config_path() -> Option<PathBuf> {
    std::env::var("HWB_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Log filter directive (`HWB_LOG`), e.g. `info,hwb_transport=debug`
pub fn log_filter() -> Option<String> {
    std::env::var("HWB_LOG").ok().filter(|s| !s.is_empty())
}

/// Transport port override (`HWB_PORT`)
pub fn port() -> Option<u16> {
    std::env::var("HWB_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// How long shutdown waits for background tasks (default 5s, `HWB_SHUTDOWN_TIMEOUT_MS`).
pub fn shutdown_timeout() -> Duration {
    std::env::var("HWB_SHUTDOWN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
