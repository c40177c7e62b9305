// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hwb_wire::TelegramCode;

fn telegram(code: TelegramCode, payload: &[u8]) -> Telegram {
    Telegram::new(code, payload).unwrap()
}

#[test]
fn front_leaves_head_in_place() {
    let queue = SendQueue::new();
    queue.push(Outbound::new(telegram(TelegramCode::Event, b"a"), Target::All));
    queue.push(Outbound::new(telegram(TelegramCode::Event, b"b"), Target::All));

    let head = queue.front().unwrap();
    assert_eq!(head.telegram.payload(), b"a");
    assert_eq!(queue.len(), 2);

    let popped = queue.pop_front().unwrap();
    assert!(Arc::ptr_eq(&head.telegram, &popped.telegram));
    assert_eq!(queue.len(), 1);
}

#[test]
fn target_filter() {
    assert!(Target::All.includes(7));
    assert!(Target::Connection(7).includes(7));
    assert!(!Target::Connection(7).includes(8));
}

#[test]
fn filtered_pop_skips_without_discarding() {
    let inbox = Inbox::default();
    inbox.push(telegram(TelegramCode::DoubleArray, b"12345678"));
    inbox.push(telegram(TelegramCode::Command, b"cmd"));
    inbox.push(telegram(TelegramCode::DoubleArray, b"87654321"));

    let command = inbox.pop(CodeFilter::Only(TelegramCode::Command)).unwrap();
    assert_eq!(command.payload(), b"cmd");
    assert_eq!(inbox.len(), 2);

    assert_eq!(inbox.pop(CodeFilter::Only(TelegramCode::Status)), None);
    assert_eq!(inbox.pop(CodeFilter::Any).unwrap().payload(), b"12345678");
}

#[test]
fn pop_latest_discards_history() {
    let inbox = Inbox::default();
    for sample in [b"1", b"2", b"3"] {
        inbox.push(telegram(TelegramCode::Event, sample));
    }

    assert_eq!(inbox.pop_latest().unwrap().payload(), b"3");
    assert_eq!(inbox.len(), 0);
    assert_eq!(inbox.pop_latest(), None);
}

#[test]
fn newcomers_are_taken_once() {
    let inbox = Inbox::default();
    inbox.add_newcomer(1);
    inbox.add_newcomer(2);

    assert_eq!(inbox.take_newcomers(), vec![1, 2]);
    assert!(inbox.take_newcomers().is_empty());
}
