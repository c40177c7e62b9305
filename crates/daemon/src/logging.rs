// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the daemon binary.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LogConfig;
use crate::lifecycle::LifecycleError;

/// Build the filter, falling back to `info` when the directive is unusable.
pub fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter {:?}: {}, using info", directive, e);
        EnvFilter::new("info")
    })
}

/// Install the global subscriber: stderr always, plus the configured file.
///
/// Keep the returned guard alive until exit so buffered file lines are flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, LifecycleError> {
    let stderr = fmt::layer().with_writer(std::io::stderr).with_filter(filter(&config.filter));

    let (file, guard) = match &config.file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = dir {
                std::fs::create_dir_all(dir)?;
            }
            let name = path
                .file_name()
                .ok_or_else(|| LifecycleError::LogFile(path.clone()))?;
            let appender = tracing_appender::rolling::never(dir.unwrap_or(std::path::Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter(&config.filter));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(file)
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;
    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
