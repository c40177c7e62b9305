// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;

use hwb_wire::WireError;
use thiserror::Error;

use crate::config::Mode;

/// Errors from I/O on a single connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Peer closed, reset or aborted the connection
    #[error("peer disconnected")]
    Disconnected,

    #[error("socket error: {0}")]
    Socket(io::Error),

    /// Inbound bytes cannot be framed; the stream is unrecoverable
    #[error("protocol error: {0}")]
    Protocol(#[from] WireError),
}

impl ConnectionError {
    /// Sort an OS error into a peer disconnect or a plain socket failure.
    pub fn from_io(err: io::Error) -> Self {
        use io::ErrorKind::*;
        match err.kind() {
            ConnectionReset | NotConnected | ConnectionAborted | BrokenPipe | UnexpectedEof
            | WriteZero => Self::Disconnected,
            _ => Self::Socket(err),
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// OS error code, when the failure came from the socket layer.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Socket(err) => err.raw_os_error(),
            _ => None,
        }
    }
}

/// Errors surfaced to endpoint callers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {mode} port {port}: {source}")]
    Bind {
        mode: Mode,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve address {0}")]
    Address(String),

    #[error("endpoint is not open")]
    NotOpen,

    #[error("unknown connection {0}")]
    UnknownConnection(u64),

    #[error("failed to start port worker: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}
