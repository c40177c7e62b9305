// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_disable_nagle_and_retry_every_second() {
    let config = PortConfig::default();

    assert_eq!(config.mode, Mode::TcpServer);
    assert!(!config.nagle);
    assert_eq!(config.connect_retry, Duration::from_secs(1));
    assert_eq!(config.max_datagram, None);
}

#[test]
fn setters_chain() {
    let config = PortConfig::tcp_client("10.0.0.2", 4001)
        .nagle(true)
        .send_timeout(Duration::from_millis(250))
        .connect_retry(Duration::from_millis(50));

    assert_eq!(config.mode, Mode::TcpClient);
    assert_eq!(config.host, "10.0.0.2");
    assert_eq!(config.port, 4001);
    assert!(config.nagle);
    assert_eq!(config.send_timeout, Duration::from_millis(250));
    assert_eq!(config.connect_retry, Duration::from_millis(50));
}

#[yare::parameterized(
    explicit_destination_wins = { Some("10.0.0.9"), "10.0.0.1", true, Some("10.0.0.9") },
    host_is_fallback = { None, "10.0.0.1", false, Some("10.0.0.1") },
    broadcast_without_host = { None, "", true, Some("255.255.255.255") },
    nothing_configured = { None, "", false, None },
)]
fn udp_target_resolution(dest: Option<&str>, host: &str, broadcast: bool, expected: Option<&str>) {
    let mut config = PortConfig::udp(5000, 5001).host(host).udp_broadcast(broadcast);
    if let Some(dest) = dest {
        config = config.udp_destination(dest);
    }
    assert_eq!(config.udp_target_host(), expected);
}

#[test]
fn deserializes_from_toml_with_millisecond_durations() {
    let config: PortConfig = toml::from_str(
        r#"
        mode = "udp"
        port = 7000
        udp_port = 7001
        udp_broadcast = true
        send_timeout_ms = 40
        max_datagram = 512
        "#,
    )
    .unwrap();

    assert_eq!(config.mode, Mode::Udp);
    assert_eq!(config.port, 7000);
    assert_eq!(config.udp_port, 7001);
    assert!(config.udp_broadcast);
    assert_eq!(config.send_timeout, Duration::from_millis(40));
    assert_eq!(config.max_datagram, Some(512));
    assert_eq!(config.idle_sleep, Duration::from_millis(1));
}

#[test]
fn mode_names_are_kebab_case() {
    assert_eq!(Mode::TcpServer.to_string(), "tcp-server");
    assert_eq!(serde_json::to_string(&Mode::TcpClient).unwrap(), "\"tcp-client\"");
}
