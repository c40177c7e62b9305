// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where a port worker's connections come from: a listening socket, an
//! outgoing connect attempt, or a single bound datagram socket.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, info};

use crate::config::{Mode, PortConfig, UDP_MAX_PAYLOAD};
use crate::error::TransportError;
use crate::socket::{RawSocket, TcpLink, UdpLink};

/// Give up on a connect that neither succeeds nor fails within this window.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const LISTEN_BACKLOG: i32 = 128;

/// Result of binding a port: the connection source plus what the worker
/// needs to know about the bound socket.
pub(crate) struct Bound {
    pub source: Source,
    /// Datagram socket created at start-up (udp mode only)
    pub datagram: Option<Box<dyn RawSocket>>,
    pub local_port: u16,
    pub max_datagram: Option<usize>,
}

pub(crate) enum Source {
    Listener(TcpListener),
    Client(Connector),
    /// Udp: the only connection already exists
    Fixed,
}

impl Source {
    /// Bind (server, udp) or prepare to connect (client).
    ///
    /// Runs on the caller's thread so a bind failure is reported by `open`.
    pub fn bind(config: &PortConfig) -> Result<Bound, TransportError> {
        let bind_err = |source| TransportError::Bind { mode: config.mode, port: config.port, source };
        match config.mode {
            Mode::TcpServer => {
                let listener = listen(config.port).map_err(bind_err)?;
                let local_port = listener.local_addr().map_err(bind_err)?.port();
                info!(port = local_port, "listening");
                Ok(Bound {
                    source: Self::Listener(listener),
                    datagram: None,
                    local_port,
                    max_datagram: None,
                })
            }
            Mode::TcpClient => {
                if config.host.is_empty() {
                    return Err(TransportError::Address(format!(":{}", config.port)));
                }
                Ok(Bound {
                    source: Self::Client(Connector::new(config)),
                    datagram: None,
                    local_port: config.port,
                    max_datagram: None,
                })
            }
            Mode::Udp => {
                let (socket, queried) = bind_udp(config.port).map_err(bind_err)?;
                let local_port = socket.local_addr().map_err(bind_err)?.port();
                let destination = udp_destination(config)?;
                let max_datagram = config.max_datagram.unwrap_or(queried);
                info!(port = local_port, ?destination, max_datagram, "udp socket bound");
                let link = UdpLink::new(socket, destination).map_err(bind_err)?;
                Ok(Bound {
                    source: Self::Fixed,
                    datagram: Some(Box::new(link)),
                    local_port,
                    max_datagram: Some(max_datagram),
                })
            }
        }
    }

    /// Poll for one new peer. `connected` is the current live-set size.
    pub fn poll(
        &mut self,
        config: &PortConfig,
        connected: usize,
    ) -> io::Result<Option<Box<dyn RawSocket>>> {
        let stream = match self {
            Self::Listener(listener) => match listener.accept() {
                Ok((stream, peer)) => {
                    info!(%peer, "accepted connection");
                    stream
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e),
            },
            Self::Client(connector) if connected == 0 => match connector.poll()? {
                Some(stream) => stream,
                None => return Ok(None),
            },
            Self::Client(_) | Self::Fixed => return Ok(None),
        };
        Ok(Some(Box::new(TcpLink::new(stream, config)?)))
    }

    /// Forget the current connect attempt; the next poll reconnects.
    pub fn invalidate(&mut self) {
        if let Self::Client(connector) = self {
            connector.invalidate();
        }
    }
}

fn listen(port: u16) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)))?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

/// Bind the datagram socket and report the largest datagram it can send.
fn bind_udp(port: u16) -> io::Result<(UdpSocket, usize)> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.bind(&SockAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)))?;
    let max = socket.send_buffer_size().map_or(UDP_MAX_PAYLOAD, |n| n.min(UDP_MAX_PAYLOAD));
    Ok((socket.into(), max))
}

fn udp_destination(config: &PortConfig) -> Result<Option<SocketAddr>, TransportError> {
    let Some(host) = config.udp_target_host() else {
        return Ok(None);
    };
    let port = if config.udp_port == 0 { config.port } else { config.udp_port };
    resolve(host, port).map(Some)
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let target = format!("{}:{}", host, port);
    let mut addrs = target.to_socket_addrs().map_err(|_| TransportError::Address(target.clone()))?;
    let first = addrs.next().ok_or_else(|| TransportError::Address(target.clone()))?;
    // Prefer IPv4: the listener side binds 0.0.0.0
    Ok(std::iter::once(first).chain(addrs).find(SocketAddr::is_ipv4).unwrap_or(first))
}

enum ConnectState {
    Idle { retry_at: Instant },
    Connecting { socket: Socket, since: Instant },
}

/// Non-blocking connect state machine for tcp-client mode.
pub(crate) struct Connector {
    host: String,
    port: u16,
    retry: Duration,
    state: ConnectState,
}

impl Connector {
    fn new(config: &PortConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            retry: config.connect_retry,
            state: ConnectState::Idle { retry_at: Instant::now() },
        }
    }

    /// Advance the attempt. Refusals and timeouts back off quietly; any other
    /// failure backs off too but is returned so the worker records it.
    fn poll(&mut self) -> io::Result<Option<TcpStream>> {
        let now = Instant::now();
        let state = std::mem::replace(&mut self.state, ConnectState::Idle { retry_at: now });
        match state {
            ConnectState::Idle { retry_at } if now < retry_at => {
                self.state = ConnectState::Idle { retry_at };
                Ok(None)
            }
            ConnectState::Idle { .. } => self.start(now),
            ConnectState::Connecting { socket, since } => self.finish(socket, since, now),
        }
    }

    fn start(&mut self, now: Instant) -> io::Result<Option<TcpStream>> {
        let addr = match resolve(&self.host, self.port) {
            Ok(addr) => addr,
            Err(e) => {
                self.back_off(now);
                return Err(io::Error::new(io::ErrorKind::NotFound, e.to_string()));
            }
        };

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        match socket.connect(&addr.into()) {
            Ok(()) => {
                info!(%addr, "connected");
                Ok(Some(socket.into()))
            }
            Err(e) if is_pending(&e) => {
                debug!(%addr, "connect in progress");
                self.state = ConnectState::Connecting { socket, since: now };
                Ok(None)
            }
            Err(e) => self.fail(e, now),
        }
    }

    fn finish(&mut self, socket: Socket, since: Instant, now: Instant) -> io::Result<Option<TcpStream>> {
        if let Some(e) = socket.take_error()? {
            return self.fail(e, now);
        }
        match socket.peer_addr() {
            Ok(peer) => {
                info!(peer = ?peer.as_socket(), "connected");
                Ok(Some(socket.into()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                if now.duration_since(since) >= CONNECT_TIMEOUT {
                    debug!(host = %self.host, port = self.port, "connect timed out, retrying");
                    self.back_off(now);
                } else {
                    self.state = ConnectState::Connecting { socket, since };
                }
                Ok(None)
            }
            Err(e) => self.fail(e, now),
        }
    }

    fn fail(&mut self, error: io::Error, now: Instant) -> io::Result<Option<TcpStream>> {
        self.back_off(now);
        if is_pending(&error) || error.kind() == io::ErrorKind::ConnectionRefused {
            debug!(host = %self.host, port = self.port, error = %error, "connect refused, retrying");
            return Ok(None);
        }
        Err(error)
    }

    fn back_off(&mut self, now: Instant) {
        self.state = ConnectState::Idle { retry_at: now + self.retry };
    }

    fn invalidate(&mut self) {
        self.state = ConnectState::Idle { retry_at: Instant::now() };
    }
}

fn is_pending(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == Some(Errno::EINPROGRESS as i32)
        || err.raw_os_error() == Some(Errno::EALREADY as i32)
}

#[cfg(test)]
#[path = "acceptor_tests.rs"]
mod tests;
