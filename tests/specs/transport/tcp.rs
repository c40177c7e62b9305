//! TCP transport specs
//!
//! A server endpoint fans out to every accepted peer; a client endpoint
//! dials out and redials after the peer goes away.

use crate::prelude::*;

#[tokio::test]
async fn responder_message_reaches_a_tcp_client_as_one_command_telegram() {
    let registry = PortRegistry::new();
    let (endpoint, port) = tcp_server(&registry);
    let responder = MessageResponder::new();
    responder.set_send_function(endpoint_sender(Arc::clone(&endpoint), TelegramCode::Command));
    let mut peer = connect_peer(&endpoint, port).await;

    responder.send_message(&Message::new("hardwaredetect", json!({}))).unwrap();

    let telegram = read_telegram_timeout(&mut peer, WAIT).await.unwrap();
    assert_eq!(telegram.code(), TelegramCode::Command);
    let message = Message::from_telegram(&telegram).unwrap();
    assert_eq!(message.id(), "hardwaredetect");
    assert_eq!(endpoint.send_queue_len(), 0);
    endpoint.close();
}

#[tokio::test]
async fn every_peer_receives_the_same_telegrams_in_order() {
    let registry = PortRegistry::new();
    let (endpoint, port) = tcp_server(&registry);
    let mut first = connect_peer(&endpoint, port).await;
    let mut second = connect_peer(&endpoint, port).await;

    let sent: Vec<Telegram> = (0..3)
        .map(|i| Telegram::text(TelegramCode::String, &format!("line {}", i)).unwrap())
        .collect();
    for telegram in &sent {
        endpoint.push_send(telegram.clone()).unwrap();
    }

    for peer in [&mut first, &mut second] {
        for expected in &sent {
            let got = read_telegram_timeout(peer, WAIT).await.unwrap();
            assert_eq!(&got, expected);
        }
    }
    endpoint.close();
}

#[tokio::test]
async fn inbound_telegrams_from_all_peers_land_in_the_endpoint() {
    let registry = PortRegistry::new();
    let (endpoint, port) = tcp_server(&registry);
    let mut first = connect_peer(&endpoint, port).await;
    let mut second = connect_peer(&endpoint, port).await;

    write_telegram(&mut first, &Telegram::new(TelegramCode::Event, b"a").unwrap()).await.unwrap();
    write_telegram(&mut second, &Telegram::new(TelegramCode::Warning, b"b").unwrap()).await.unwrap();

    wait_until("both telegrams", || endpoint.pending() == 2).await;
    let warning = endpoint.pop_receive(CodeFilter::Only(TelegramCode::Warning)).unwrap();
    assert_eq!(warning.payload(), b"b");
    let event = endpoint.pop_receive(CodeFilter::Any).unwrap();
    assert_eq!(event.payload(), b"a");
    endpoint.close();
}

#[tokio::test]
async fn client_endpoint_redials_after_the_server_drops_it() {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let registry = PortRegistry::new();
    let endpoint = registry.endpoint();
    endpoint
        .open(PortConfig::tcp_client("127.0.0.1", port).connect_retry(Duration::from_millis(20)))
        .unwrap();

    let (first, _) = tokio::time::timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    wait_until("connected", || endpoint.connection_count() == 1).await;
    drop(first);

    let (mut second, _) = tokio::time::timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    write_telegram(&mut second, &Telegram::new(TelegramCode::Status, b"back").unwrap())
        .await
        .unwrap();

    let got = tokio::time::timeout(WAIT, endpoint.recv(CodeFilter::Only(TelegramCode::Status)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.payload(), b"back");
    endpoint.close();
}
