// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport parameters accepted when opening an endpoint.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Largest UDP payload over IPv4.
pub const UDP_MAX_PAYLOAD: usize = 65_507;

/// How a port worker obtains its connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Bind + listen, accept any number of peers
    #[default]
    TcpServer,
    /// Connect to `host:port`, reconnecting after every disconnect
    TcpClient,
    /// Connectionless; one socket bound to the local port
    Udp,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TcpServer => "tcp-server",
            Self::TcpClient => "tcp-client",
            Self::Udp => "udp",
        })
    }
}

/// Port configuration.
///
/// In `udp` mode `port` is the local receive port and `udp_port` the remote
/// port datagrams are sent to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub mode: Mode,
    /// Listen port (server, udp) or remote port (client). 0 picks an ephemeral port.
    pub port: u16,
    pub udp_port: u16,
    /// Remote host for client mode, default UDP destination otherwise
    pub host: String,
    /// Accepted for compatibility; the worker is always non-blocking.
    pub blocking: bool,
    /// Keep Nagle's algorithm enabled (TCP_NODELAY off)
    pub nagle: bool,
    #[serde(rename = "send_timeout_ms", with = "duration_ms")]
    pub send_timeout: Duration,
    pub udp_broadcast: bool,
    pub udp_destination: Option<String>,
    /// Overrides the datagram limit queried from the socket
    pub max_datagram: Option<usize>,
    #[serde(rename = "connect_retry_ms", with = "duration_ms")]
    pub connect_retry: Duration,
    #[serde(rename = "idle_sleep_ms", with = "duration_ms")]
    pub idle_sleep: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            mode: Mode::TcpServer,
            port: 0,
            udp_port: 0,
            host: String::new(),
            blocking: false,
            nagle: false,
            send_timeout: Duration::ZERO,
            udp_broadcast: false,
            udp_destination: None,
            max_datagram: None,
            connect_retry: Duration::from_secs(1),
            idle_sleep: Duration::from_millis(1),
        }
    }
}

impl PortConfig {
    pub fn tcp_server(port: u16) -> Self {
        Self { mode: Mode::TcpServer, port, ..Self::default() }
    }

    pub fn tcp_client(host: impl Into<String>, port: u16) -> Self {
        Self { mode: Mode::TcpClient, port, host: host.into(), ..Self::default() }
    }

    pub fn udp(port: u16, udp_port: u16) -> Self {
        Self { mode: Mode::Udp, port, udp_port, ..Self::default() }
    }

    pub fn host(mut self, v: impl Into<String>) -> Self {
        self.host = v.into();
        self
    }

    pub fn blocking(mut self, v: bool) -> Self {
        self.blocking = v;
        self
    }

    pub fn nagle(mut self, v: bool) -> Self {
        self.nagle = v;
        self
    }

    pub fn send_timeout(mut self, v: Duration) -> Self {
        self.send_timeout = v;
        self
    }

    pub fn udp_broadcast(mut self, v: bool) -> Self {
        self.udp_broadcast = v;
        self
    }

    pub fn udp_destination(mut self, v: impl Into<String>) -> Self {
        self.udp_destination = Some(v.into());
        self
    }

    pub fn max_datagram(mut self, v: usize) -> Self {
        self.max_datagram = Some(v);
        self
    }

    pub fn connect_retry(mut self, v: Duration) -> Self {
        self.connect_retry = v;
        self
    }

    pub fn idle_sleep(mut self, v: Duration) -> Self {
        self.idle_sleep = v;
        self
    }

    /// Host datagrams go to when no peer address is known yet.
    pub(crate) fn udp_target_host(&self) -> Option<&str> {
        if let Some(dest) = self.udp_destination.as_deref().filter(|d| !d.is_empty()) {
            return Some(dest);
        }
        if !self.host.is_empty() {
            return Some(&self.host);
        }
        if self.udp_broadcast {
            return Some("255.255.255.255");
        }
        None
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
