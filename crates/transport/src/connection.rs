// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One physical socket plus its per-direction framing state.
//!
//! A connection is owned by exactly one port worker and only ever touched from
//! that worker's thread, so none of its state is locked.

use std::io;
use std::net::SocketAddr;

use hwb_wire::{FrameBuffer, Telegram};

use crate::error::ConnectionError;
use crate::socket::RawSocket;

/// Identifier of a live connection, unique per port worker.
pub type ConnectionId = u64;

/// Bytes requested per read; also bounds a single UDP datagram.
const READ_CHUNK: usize = 64 * 1024;

pub struct Connection {
    id: ConnectionId,
    socket: Box<dyn RawSocket>,
    frames: FrameBuffer,
    /// Bytes of the current outbound telegram already written
    cursor: usize,
    scratch: Vec<u8>,
}

impl Connection {
    pub fn new(id: ConnectionId, socket: Box<dyn RawSocket>) -> Self {
        Self { id, socket, frames: FrameBuffer::new(), cursor: 0, scratch: vec![0; READ_CHUNK] }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_datagram(&self) -> bool {
        self.socket.is_datagram()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.socket.peer_addr()
    }

    /// Non-blocking poll for pending input or a pending error condition.
    pub fn data_available(&mut self) -> Result<bool, ConnectionError> {
        self.socket.readable().map_err(ConnectionError::from_io)
    }

    /// One non-blocking read appended to the accumulation buffer.
    ///
    /// Returns the number of bytes read; follow with [`Self::extract_telegram`].
    pub fn receive(&mut self) -> Result<usize, ConnectionError> {
        match self.socket.read(&mut self.scratch) {
            Ok(0) if !self.socket.is_datagram() => Err(ConnectionError::Disconnected),
            Ok(n) => {
                self.frames.extend(&self.scratch[..n]);
                Ok(n)
            }
            Err(e) if is_retry(&e) => Ok(0),
            Err(e) => Err(ConnectionError::from_io(e)),
        }
    }

    /// Next complete telegram from the accumulation buffer, if any.
    pub fn extract_telegram(&mut self) -> Result<Option<Telegram>, ConnectionError> {
        Ok(self.frames.extract()?)
    }

    /// Write as much of `telegram` as the socket accepts right now.
    ///
    /// Returns `true` once every byte has been written. The cursor then stays
    /// at the telegram's end (further calls are no-ops) until the worker calls
    /// [`Self::reset_send_cursor`]. Datagram sockets write all-or-nothing.
    pub fn send(&mut self, telegram: &Telegram) -> Result<bool, ConnectionError> {
        let bytes = telegram.as_bytes();
        if self.cursor >= bytes.len() {
            return Ok(true);
        }

        if self.socket.is_datagram() {
            return match self.socket.write(bytes) {
                Ok(n) if n == bytes.len() => {
                    self.cursor = bytes.len();
                    Ok(true)
                }
                // A short datagram is not a partial success; resend it whole
                Ok(_) => Ok(false),
                Err(e) if is_retry(&e) => Ok(false),
                Err(e) => Err(ConnectionError::from_io(e)),
            };
        }

        match self.socket.write(&bytes[self.cursor..]) {
            Ok(0) => Err(ConnectionError::Disconnected),
            Ok(n) => {
                self.cursor += n;
                Ok(self.cursor >= bytes.len())
            }
            Err(e) if is_retry(&e) => Ok(false),
            Err(e) => Err(ConnectionError::from_io(e)),
        }
    }

    pub fn send_cursor(&self) -> usize {
        self.cursor
    }

    /// Start the next telegram from byte 0.
    ///
    /// Only called once every targeted connection finished the current one.
    pub fn reset_send_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Drop any partially framed input.
    pub fn discard_input(&mut self) {
        self.frames = FrameBuffer::new();
    }

    /// Bytes received but not yet framed.
    pub fn buffered(&self) -> usize {
        self.frames.buffered()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer_addr())
            .field("cursor", &self.cursor)
            .field("buffered", &self.frames.buffered())
            .finish()
    }
}

fn is_retry(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
