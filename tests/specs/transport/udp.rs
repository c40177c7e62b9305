//! UDP transport specs

use hwb_wire::WireError;

use crate::prelude::*;

#[tokio::test]
async fn oversized_telegram_is_rejected_and_nothing_is_queued() {
    let registry = PortRegistry::new();
    let endpoint = registry.endpoint();
    endpoint.open(PortConfig::udp(0, 0).host("127.0.0.1").max_datagram(512)).unwrap();
    assert_eq!(endpoint.max_datagram(), Some(512));

    let telegram = Telegram::new(TelegramCode::TestBig, &[7u8; 595]).unwrap();
    assert_eq!(telegram.size(), 600);

    let err = endpoint.push_send(telegram).unwrap_err();
    assert!(
        matches!(err, TransportError::Wire(WireError::PayloadTooLarge { size: 600, max: 512 })),
        "{:?}",
        err
    );
    assert_eq!(endpoint.send_queue_len(), 0);
    endpoint.close();
}

#[tokio::test]
async fn datagrams_carry_one_telegram_each_way() {
    let peer = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
    let peer_port = peer.local_addr().unwrap().port();

    let registry = PortRegistry::new();
    let endpoint = registry.endpoint();
    endpoint.open(PortConfig::udp(0, peer_port).host("127.0.0.1")).unwrap();
    let local_port = endpoint.local_port().unwrap();

    endpoint.push_send(Telegram::text(TelegramCode::String, "hello").unwrap()).unwrap();
    let mut buf = vec![0u8; 1024];
    let (len, _) = tokio::time::timeout(WAIT, peer.recv_from(&mut buf)).await.unwrap().unwrap();
    let got = Telegram::from_frame(buf[..len].to_vec()).unwrap();
    assert_eq!(got.to_text().unwrap(), "hello");

    let reply = Telegram::new(TelegramCode::Event, b"ack").unwrap();
    peer.send_to(reply.as_bytes(), ("127.0.0.1", local_port)).await.unwrap();
    let received = tokio::time::timeout(WAIT, endpoint.recv(CodeFilter::Any)).await.unwrap().unwrap();
    assert_eq!(received, reply);
    endpoint.close();
}
