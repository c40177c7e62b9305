// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: a TOML file plus environment overrides.
//!
//! ```toml
//! [transport]
//! mode = "tcp-server"
//! port = 5000
//!
//! [driver]
//! backend = "simulated"
//! frequency_hz = 50.0
//! channels = 3
//!
//! [log]
//! filter = "info"
//! file = "/var/log/hwbd.log"
//! ```

use std::path::{Path, PathBuf};

use hwb_transport::PortConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port the daemon serves when nothing else is configured.
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Synthetic device producing sine samples
    #[default]
    Simulated,
    /// No hardware: detection reports an empty device list
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub backend: Backend,
    /// Tick rate used when `checkinitialize` does not name one
    pub frequency_hz: f64,
    pub channels: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { backend: Backend::Simulated, frequency_hz: 50.0, channels: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `HWB_LOG` takes precedence
    pub filter: String,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: PortConfig,
    pub driver: DriverConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: PortConfig::tcp_server(DEFAULT_PORT),
            driver: DriverConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parse a config file. Missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        let config: Self = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Config for this process: `HWB_CONFIG` (or defaults) with env overrides applied.
    pub fn resolve() -> Result<Self, ConfigError> {
        let mut config = match crate::env::config_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(crate::env::port(), crate::env::log_filter());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, port: Option<u16>, log_filter: Option<String>) {
        if let Some(port) = port {
            self.transport.port = port;
        }
        if let Some(filter) = log_filter {
            self.log.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.driver.frequency_hz.is_finite() && self.driver.frequency_hz > 0.0) {
            return Err(ConfigError::Invalid {
                field: "driver.frequency_hz",
                reason: format!("{} is not a positive rate", self.driver.frequency_hz),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
