// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegram wire protocol for the hardware bridge.
//!
//! Wire format: 4-byte size (little-endian, header included) + 1-byte code + payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod code;
mod error;
mod frame;
mod message;
mod telegram;
mod wire;

pub use code::{CodeFilter, TelegramCode, WILDCARD_CODE};
pub use error::WireError;
pub use frame::FrameBuffer;
pub use message::Message;
pub use telegram::{decode_header, encode, Header, Telegram, HEADER_SIZE};
pub use wire::{
    read_message, read_telegram, read_telegram_timeout, write_message, write_telegram,
    ProtocolError,
};
