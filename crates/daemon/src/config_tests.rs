// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

use hwb_transport::Mode;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn empty_file_gives_defaults() {
    let file = write_config("");

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.transport.port, DEFAULT_PORT);
    assert_eq!(config.driver.backend, Backend::Simulated);
}

#[test]
fn sections_override_defaults() {
    let file = write_config(
        r#"
        [transport]
        mode = "udp"
        port = 6100
        udp_port = 6101
        host = "192.168.1.20"

        [driver]
        backend = "null"
        frequency_hz = 10.0

        [log]
        filter = "debug"
        file = "/tmp/hwbd.log"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.transport.mode, Mode::Udp);
    assert_eq!(config.transport.udp_port, 6101);
    assert_eq!(config.driver.backend, Backend::Null);
    assert_eq!(config.driver.frequency_hz, 10.0);
    assert_eq!(config.driver.channels, 3);
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/hwbd.log")));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[yare::parameterized(
    syntax = { "[transport" },
    bad_mode = { "[transport]\nmode = \"serial\"" },
    bad_backend = { "[driver]\nbackend = \"leica\"" },
)]
fn malformed_file_is_a_parse_error(text: &str) {
    let file = write_config(text);

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{:?}", err);
}

#[yare::parameterized(
    zero = { "0.0" },
    negative = { "-5.0" },
)]
fn non_positive_frequency_is_rejected(rate: &str) {
    let file = write_config(&format!("[driver]\nfrequency_hz = {}", rate));

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "driver.frequency_hz", .. }));
}

#[test]
fn overrides_replace_port_and_filter() {
    let mut config = Config::default();

    config.apply_overrides(Some(7001), Some("hwb_transport=trace".to_string()));
    assert_eq!(config.transport.port, 7001);
    assert_eq!(config.log.filter, "hwb_transport=trace");

    config.apply_overrides(None, None);
    assert_eq!(config.transport.port, 7001);
}
