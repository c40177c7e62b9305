// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket layer of the hardware bridge.
//!
//! One port worker thread per open port multiplexes any number of
//! connections (tcp server fan-out, tcp client with reconnect, udp) and
//! delivers whole telegrams in order. Applications use [`Endpoint`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod connection;
mod endpoint;
mod error;
mod queue;
mod registry;
mod socket;
mod worker;

#[cfg(test)]
mod fake;

pub use config::{Mode, PortConfig, UDP_MAX_PAYLOAD};
pub use connection::{Connection, ConnectionId};
pub use endpoint::Endpoint;
pub use error::{ConnectionError, TransportError};
pub use queue::{CountCallback, Target};
pub use registry::{PortRegistry, WorkerKey};
pub use socket::{RawSocket, TcpLink, UdpLink};

pub use hwb_wire::{CodeFilter, Telegram, TelegramCode};
