// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the end-to-end scenarios.

pub use std::sync::Arc;
pub use std::time::Duration;

pub use hwb_messaging::{endpoint_sender, serve, Message, MessageResponder};
pub use hwb_transport::{
    CodeFilter, Endpoint, PortConfig, PortRegistry, Telegram, TelegramCode, TransportError,
};
pub use hwb_wire::{read_message, read_telegram_timeout, write_message, write_telegram};
pub use serde_json::json;
pub use tokio::net::{TcpStream, UdpSocket};
pub use tokio_util::sync::CancellationToken;

/// Upper bound for every wait on a socket or a reply.
pub const WAIT: Duration = Duration::from_secs(5);

/// Poll `cond` until it holds, failing the test after [`WAIT`].
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let polled = tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {}", what);
}

/// TCP server endpoint on an ephemeral port.
pub fn tcp_server(registry: &PortRegistry) -> (Arc<Endpoint>, u16) {
    let endpoint = Arc::new(registry.endpoint());
    endpoint.open(PortConfig::tcp_server(0)).unwrap();
    let port = endpoint.local_port().unwrap();
    (endpoint, port)
}

/// Connect a raw peer and wait until `endpoint` has seen it.
pub async fn connect_peer(endpoint: &Endpoint, port: u16) -> TcpStream {
    let before = endpoint.connection_count();
    let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    wait_until("peer accepted", || endpoint.connection_count() > before).await;
    stream
}
