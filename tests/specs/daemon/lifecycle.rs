//! Daemon lifecycle specs
//!
//! Start the daemon from a config file on an ephemeral port, talk to it as a
//! controlling application would, and stop it with a `shutdown` message.

use std::io::Write;

use hwb_daemon::{startup, Config, StopReason};

use crate::prelude::*;

fn config_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn controller_detects_initializes_and_shuts_down_the_driver() {
    let file = config_file(
        r#"
        [transport]
        mode = "tcp-server"
        port = 0

        [driver]
        backend = "simulated"
        channels = 2
        "#,
    );
    let config = Config::load(file.path()).unwrap();
    let mut daemon = startup(&config).unwrap();
    let port = daemon.local_port().unwrap();
    let mut controller = connect_peer(daemon.endpoint(), port).await;

    let session = tokio::spawn(async move {
        write_message(&mut controller, &Message::empty("hardwaredetect")).await.unwrap();
        let detected = read_message(&mut controller, WAIT).await.unwrap();

        let init = Message::empty("checkinitialize").with_param("frequency", 100.0);
        write_message(&mut controller, &init).await.unwrap();
        let initialized = read_message(&mut controller, WAIT).await.unwrap();

        let samples = loop {
            let telegram = read_telegram_timeout(&mut controller, WAIT).await.unwrap();
            if telegram.code() == TelegramCode::DoubleArray {
                break telegram.to_doubles().unwrap();
            }
        };

        write_message(&mut controller, &Message::empty("shutdown")).await.unwrap();
        (controller, detected, initialized, samples)
    });

    let reason = tokio::time::timeout(WAIT, daemon.run()).await.unwrap().unwrap();
    assert_eq!(reason, StopReason::ShutdownMessage);
    daemon.shutdown(WAIT).await;

    let (mut controller, detected, initialized, samples) = session.await.unwrap();
    assert_eq!(detected.param("devices").unwrap()[0]["serial"], "SIM-0001");
    assert_eq!(initialized.param("initialized"), Some(&json!(true)));
    assert_eq!(samples.len(), 2);

    let farewell = read_message(&mut controller, WAIT).await.unwrap();
    assert_eq!(farewell.id(), "shutdown");

    // Shutdown closed the endpoint synchronously
    std::net::TcpListener::bind(("0.0.0.0", port)).unwrap();
}
