// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live connection set of one port worker and its per-cycle send/receive steps.

use hwb_wire::Telegram;
use tracing::{debug, warn};

use crate::connection::{Connection, ConnectionId};
use crate::error::ConnectionError;
use crate::queue::SendQueue;
use crate::socket::RawSocket;

/// Upper bound on reads per connection per cycle, so one busy peer cannot
/// starve the send step.
const MAX_READS_PER_CYCLE: usize = 16;

/// What happened to the connection set during one step.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Telegrams fully delivered and popped from the send queue
    pub sent: usize,
    /// Any byte moved in either direction
    pub progressed: bool,
    /// Connections removed because the peer went away or the stream broke
    pub dropped: Vec<ConnectionId>,
    /// Non-fatal errors to record on the shared error state
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct LinkSet {
    connections: Vec<Connection>,
    next_id: ConnectionId,
}

impl LinkSet {
    pub fn new() -> Self {
        Self { connections: Vec::new(), next_id: 1 }
    }

    pub fn add(&mut self, socket: Box<dyn RawSocket>) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.connections.push(Connection::new(id, socket));
        id
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id() == id)?;
        Some(self.connections.remove(index))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(Connection::id).collect()
    }

    pub fn clear(&mut self) {
        self.connections.clear();
    }

    /// Drain the outbound FIFO head-first.
    ///
    /// The head telegram is written to every targeted connection. It is popped,
    /// and every cursor reset, only after all of them report completion; until
    /// then no connection starts the next telegram.
    pub fn pump_outbound(&mut self, queue: &SendQueue) -> StepReport {
        let mut report = StepReport::default();

        while let Some(head) = queue.front() {
            let mut complete = true;
            let mut failed = Vec::new();

            for conn in self.connections.iter_mut().filter(|c| head.target.includes(c.id())) {
                let before = conn.send_cursor();
                match conn.send(&head.telegram) {
                    Ok(done) => complete &= done,
                    Err(e) => {
                        let datagram = conn.is_datagram();
                        if let Some(error) = handle_failure(conn, e, &mut failed) {
                            report.errors.push(error);
                            // A failed datagram is dropped; a stream retries next cycle
                            complete &= datagram;
                        }
                    }
                }
                report.progressed |= conn.send_cursor() != before;
            }

            for id in failed {
                self.remove(id);
                report.dropped.push(id);
            }

            if !complete {
                break;
            }

            queue.pop_front();
            for conn in &mut self.connections {
                conn.reset_send_cursor();
            }
            report.sent += 1;
            report.progressed = true;
        }

        report
    }

    /// Read every connection and extract all complete telegrams, in order.
    pub fn receive_all(&mut self, inbound: &mut Vec<Telegram>) -> StepReport {
        let mut report = StepReport::default();
        let mut failed = Vec::new();

        for conn in &mut self.connections {
            if let Err(e) = receive_one(conn, inbound, &mut report) {
                if let Some(error) = handle_failure(conn, e, &mut failed) {
                    report.errors.push(error);
                }
            }
        }

        for id in failed {
            self.remove(id);
            report.dropped.push(id);
        }
        report
    }
}

fn receive_one(
    conn: &mut Connection,
    inbound: &mut Vec<Telegram>,
    report: &mut StepReport,
) -> Result<(), ConnectionError> {
    for _ in 0..MAX_READS_PER_CYCLE {
        if !conn.data_available()? {
            break;
        }
        if conn.receive()? > 0 {
            report.progressed = true;
        }
        while let Some(telegram) = conn.extract_telegram()? {
            inbound.push(telegram);
        }
    }
    Ok(())
}

/// Decide what a connection error means for the connection.
///
/// Stream disconnects and protocol errors mark the connection for removal.
/// Anything else is returned as an error to record; the connection stays.
/// Datagram sockets are never removed; a bad datagram only clears the buffer.
fn handle_failure(
    conn: &mut Connection,
    error: ConnectionError,
    failed: &mut Vec<ConnectionId>,
) -> Option<String> {
    let id = conn.id();
    match error {
        ConnectionError::Disconnected if !conn.is_datagram() => {
            debug!(connection = id, peer = ?conn.peer_addr(), "peer disconnected");
            failed.push(id);
            None
        }
        ConnectionError::Protocol(e) if !conn.is_datagram() => {
            warn!(connection = id, error = %e, "dropping connection with corrupt stream");
            failed.push(id);
            Some(format!("connection {}: {}", id, e))
        }
        ConnectionError::Protocol(e) => {
            warn!(connection = id, error = %e, "discarding malformed datagram");
            conn.discard_input();
            Some(format!("connection {}: {}", id, e))
        }
        other => {
            warn!(connection = id, error = %other, os_code = ?other.os_code(), "socket error");
            Some(format!("connection {}: {}", id, other))
        }
    }
}

#[cfg(test)]
#[path = "links_tests.rs"]
mod tests;
