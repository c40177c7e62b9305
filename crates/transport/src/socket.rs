// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket seam between a [`Connection`](crate::Connection) and the OS.
//!
//! Every implementation is non-blocking: an operation that cannot make
//! progress returns `io::ErrorKind::WouldBlock`.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};

use tracing::debug;

use crate::config::PortConfig;

/// Raw non-blocking byte transport under one connection.
pub trait RawSocket: Send {
    /// Whether a read would return data (or report an error / EOF).
    fn readable(&mut self) -> io::Result<bool>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Datagram sockets deliver whole messages and have no peer-level disconnect.
    fn is_datagram(&self) -> bool {
        false
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Stream socket for both server-accepted and client-connected peers.
pub struct TcpLink {
    stream: TcpStream,
    peer: Option<SocketAddr>,
}

impl TcpLink {
    /// Apply the socket option policy: non-blocking, Nagle per config.
    pub fn new(stream: TcpStream, config: &PortConfig) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(!config.nagle)?;
        if !config.send_timeout.is_zero() {
            stream.set_write_timeout(Some(config.send_timeout))?;
        }
        let peer = stream.peer_addr().ok();
        Ok(Self { stream, peer })
    }
}

impl RawSocket for TcpLink {
    fn readable(&mut self) -> io::Result<bool> {
        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe) {
            // Ok(0) is EOF; the following read reports it as a disconnect
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

/// Connectionless socket bound to the local receive port.
pub struct UdpLink {
    socket: UdpSocket,
    destination: Option<SocketAddr>,
    last_peer: Option<SocketAddr>,
}

impl UdpLink {
    pub fn new(socket: UdpSocket, destination: Option<SocketAddr>) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        socket.set_broadcast(true)?;
        Ok(Self { socket, destination, last_peer: None })
    }
}

impl RawSocket for UdpLink {
    fn readable(&mut self) -> io::Result<bool> {
        let mut probe = [0u8; 1];
        match self.socket.peek_from(&mut probe) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (n, from) = self.socket.recv_from(buf)?;
        self.last_peer = Some(from);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.destination.or(self.last_peer) {
            Some(target) => self.socket.send_to(buf, target),
            None => {
                debug!(size = buf.len(), "no udp destination known, dropping datagram");
                Ok(buf.len())
            }
        }
    }

    fn is_datagram(&self) -> bool {
        true
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.destination.or(self.last_peer)
    }
}
