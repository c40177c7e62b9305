// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    double_array = { 0, TelegramCode::DoubleArray },
    command = { 1, TelegramCode::Command },
    status = { 2, TelegramCode::Status },
    configuration = { 3, TelegramCode::Configuration },
    string = { 4, TelegramCode::String },
    event = { 5, TelegramCode::Event },
    interrupt = { 6, TelegramCode::Interrupt },
    warning = { 7, TelegramCode::Warning },
    test_big = { 10, TelegramCode::TestBig },
    invalid = { 100, TelegramCode::Invalid },
)]
fn defined_codes_map_to_wire_bytes(byte: u8, code: TelegramCode) {
    assert_eq!(TelegramCode::from_u8(byte), code);
    assert_eq!(code.as_u8(), byte);
}

#[test]
fn unknown_bytes_are_preserved() {
    let code = TelegramCode::from(42);
    assert_eq!(code, TelegramCode::Other(42));
    assert_eq!(u8::from(code), 42);
    assert_eq!(code.to_string(), "code-42");
}

#[test]
fn wildcard_byte_is_a_filter_not_a_code() {
    assert_eq!(CodeFilter::from_u8(WILDCARD_CODE), CodeFilter::Any);
    assert_eq!(CodeFilter::from_u8(1), CodeFilter::Only(TelegramCode::Command));
}

#[test]
fn filter_matches_only_selected_code() {
    let filter = CodeFilter::from(TelegramCode::Status);
    assert!(filter.matches(TelegramCode::Status));
    assert!(!filter.matches(TelegramCode::Command));
    assert!(CodeFilter::Any.matches(TelegramCode::Other(9)));
}

#[test]
fn structured_codes_are_command_and_status() {
    assert!(TelegramCode::Command.is_structured());
    assert!(TelegramCode::Status.is_structured());
    assert!(!TelegramCode::String.is_structured());
}
