// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory socket for connection and worker tests.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::socket::RawSocket;

#[derive(Default)]
struct FakeState {
    /// Chunks handed out one per read
    inbound: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    write_calls: usize,
    /// Max bytes accepted per write call
    write_limit: Option<usize>,
    write_blocked: bool,
    write_error: Option<io::ErrorKind>,
    read_error: Option<io::ErrorKind>,
    eof: bool,
}

/// Socket half handed to a `Connection`.
pub struct FakeSocket {
    state: Arc<Mutex<FakeState>>,
    datagram: bool,
}

/// Test-side handle that scripts and inspects a [`FakeSocket`].
#[derive(Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSocket {
    pub fn stream() -> (Box<dyn RawSocket>, FakeHandle) {
        Self::build(false)
    }

    pub fn datagram() -> (Box<dyn RawSocket>, FakeHandle) {
        Self::build(true)
    }

    fn build(datagram: bool) -> (Box<dyn RawSocket>, FakeHandle) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        (Box::new(Self { state: Arc::clone(&state), datagram }), FakeHandle { state })
    }
}

impl FakeHandle {
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().inbound.push_back(bytes.to_vec());
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().write_calls
    }

    pub fn limit_writes(&self, max: usize) {
        self.state.lock().write_limit = Some(max);
    }

    pub fn block_writes(&self, blocked: bool) {
        self.state.lock().write_blocked = blocked;
    }

    pub fn fail_writes(&self, kind: io::ErrorKind) {
        self.state.lock().write_error = Some(kind);
    }

    pub fn fail_reads(&self, kind: io::ErrorKind) {
        self.state.lock().read_error = Some(kind);
    }

    /// Peer closes its side: reads return 0 once inbound data is drained.
    pub fn close(&self) {
        self.state.lock().eof = true;
    }
}

impl RawSocket for FakeSocket {
    fn readable(&mut self) -> io::Result<bool> {
        let state = self.state.lock();
        if let Some(kind) = state.read_error {
            return Err(kind.into());
        }
        Ok(!state.inbound.is_empty() || state.eof)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if let Some(kind) = state.read_error {
            return Err(kind.into());
        }
        let Some(mut chunk) = state.inbound.pop_front() else {
            if state.eof {
                return Ok(0);
            }
            return Err(io::ErrorKind::WouldBlock.into());
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() && !self.datagram {
            chunk.drain(..n);
            state.inbound.push_front(chunk);
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.write_calls += 1;
        if let Some(kind) = state.write_error {
            return Err(kind.into());
        }
        if state.write_blocked {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = state.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        if self.datagram && n < buf.len() {
            // Truncated datagrams never reach the peer
            return Ok(n);
        }
        state.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn is_datagram(&self) -> bool {
        self.datagram
    }
}
