//! Request/reply specs across two endpoints
//!
//! One side subscribes a handler, the other issues requests; both run the
//! endpoint pump as a background task.

use crate::prelude::*;

struct Side {
    endpoint: Arc<Endpoint>,
    responder: MessageResponder,
    cancel: CancellationToken,
}

impl Side {
    fn new(endpoint: Arc<Endpoint>) -> Self {
        let responder = MessageResponder::new();
        responder.set_send_function(endpoint_sender(Arc::clone(&endpoint), TelegramCode::Command));
        let cancel = CancellationToken::new();
        tokio::spawn(serve(Arc::clone(&endpoint), responder.clone(), cancel.clone()));
        Self { endpoint, responder, cancel }
    }

    fn stop(self) {
        self.cancel.cancel();
        self.endpoint.close();
    }
}

async fn pair(registry: &PortRegistry) -> (Side, Side) {
    let (server_endpoint, port) = tcp_server(registry);
    let client_endpoint = Arc::new(registry.endpoint());
    client_endpoint.open(PortConfig::tcp_client("127.0.0.1", port)).unwrap();
    wait_until("link up", || {
        server_endpoint.connection_count() == 1 && client_endpoint.connection_count() == 1
    })
    .await;
    (Side::new(server_endpoint), Side::new(client_endpoint))
}

#[tokio::test]
async fn request_resolves_with_the_handler_reply() {
    let registry = PortRegistry::new();
    let (server, client) = pair(&registry).await;
    let _detect = server.responder.subscribe("hardwaredetect", |m| {
        Some(Message::new(m.id(), json!({ "devices": ["SIM-0001"] })))
    });

    let reply = client.responder.send_request(Message::empty("hardwaredetect")).unwrap();
    let reply = tokio::time::timeout(WAIT, reply).await.unwrap().unwrap();

    assert_eq!(reply.id(), "hardwaredetect");
    assert_eq!(reply.param("devices"), Some(&json!(["SIM-0001"])));
    assert!(client.responder.pending_requests().is_empty());
    server.stop();
    client.stop();
}

#[tokio::test]
async fn both_subscribers_see_a_broadcast_once() {
    let registry = PortRegistry::new();
    let (server, client) = pair(&registry).await;
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let subs: Vec<_> = ["first", "second"]
        .into_iter()
        .map(|name| {
            let seen = Arc::clone(&seen);
            client.responder.subscribe("status", move |m| {
                seen.lock().unwrap().push((name, m.param("level").cloned()));
                None
            })
        })
        .collect();

    server.responder.send_message(&Message::empty("status").with_param("level", 3)).unwrap();

    wait_until("both handlers", || seen.lock().unwrap().len() == 2).await;
    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by_key(|(name, _)| *name);
    assert_eq!(seen, vec![("first", Some(json!(3))), ("second", Some(json!(3)))]);
    drop(subs);
    server.stop();
    client.stop();
}

#[tokio::test]
async fn unanswered_request_stays_pending_until_cancelled() {
    let registry = PortRegistry::new();
    let (server, client) = pair(&registry).await;

    let reply = client.responder.send_request(Message::empty("nobody-home")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.responder.pending_requests(), vec!["nobody-home".to_owned()]);

    assert!(client.responder.cancel_request("nobody-home"));
    assert!(tokio::time::timeout(WAIT, reply).await.unwrap().is_err());
    server.stop();
    client.stop();
}
