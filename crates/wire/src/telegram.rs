// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegram: one framed unit of the wire protocol.
//!
//! ```text
//! ┌────────────────────┬───────────┬──────────────────────┐
//! │ size (4 bytes, LE) │ code (1)  │ payload (size - 5)   │
//! └────────────────────┴───────────┴──────────────────────┘
//! ```
//!
//! `size` counts the header too. A telegram keeps its encoded bytes so the
//! transport can resume a partial write from any offset without re-encoding.

use crate::code::{TelegramCode, WILDCARD_CODE};
use crate::error::WireError;

/// Fixed header length: `u32` size + `u8` code.
pub const HEADER_SIZE: usize = 5;

/// Decoded telegram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total telegram length including the header
    pub size: u32,
    pub code: TelegramCode,
}

impl Header {
    pub fn frame_len(&self) -> usize {
        self.size as usize
    }
}

/// Decode the header at the start of `bytes`.
///
/// Returns `None` while fewer than [`HEADER_SIZE`] bytes are available; the
/// caller is expected to wait for more input.
pub fn decode_header(bytes: &[u8]) -> Option<Header> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }
    let size = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Some(Header { size, code: TelegramCode::from_u8(bytes[4]) })
}

/// Encode `(code, payload)` into wire bytes.
pub fn encode(code: TelegramCode, payload: &[u8]) -> Vec<u8> {
    let size = HEADER_SIZE + payload.len();
    let mut bytes = Vec::with_capacity(size);
    // Sizes beyond u32 cannot be represented; `Telegram::new` rejects them first.
    bytes.extend_from_slice(&(size as u32).to_le_bytes());
    bytes.push(code.as_u8());
    bytes.extend_from_slice(payload);
    bytes
}

/// One framed unit: header plus payload, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    code: TelegramCode,
    bytes: Vec<u8>,
}

impl Telegram {
    /// Frame a raw payload.
    ///
    /// Payloads whose framed length exceeds `u32::MAX` are rejected with
    /// [`WireError::Oversized`]; the wildcard byte with [`WireError::ReservedCode`].
    pub fn new(code: TelegramCode, payload: &[u8]) -> Result<Self, WireError> {
        if code.as_u8() == WILDCARD_CODE {
            return Err(WireError::ReservedCode { code: WILDCARD_CODE });
        }
        let size = HEADER_SIZE + payload.len();
        if u32::try_from(size).is_err() {
            return Err(WireError::Oversized { size });
        }
        Ok(Self { code, bytes: encode(code, payload) })
    }

    /// Frame a payload, failing when the result exceeds a datagram limit.
    pub fn bounded(code: TelegramCode, payload: &[u8], max: usize) -> Result<Self, WireError> {
        let telegram = Self::new(code, payload)?;
        telegram.check_datagram(max)?;
        Ok(telegram)
    }

    /// Double-array telegram: each value as 8 little-endian bytes, in order.
    pub fn doubles(values: &[f64]) -> Result<Self, WireError> {
        let mut payload = Vec::with_capacity(values.len() * 8);
        for value in values {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        Self::new(TelegramCode::DoubleArray, &payload)
    }

    /// Text telegram. A trailing NUL is appended for legacy consumers that
    /// read the payload as a C string.
    pub fn text(code: TelegramCode, text: &str) -> Result<Self, WireError> {
        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        Self::new(code, &payload)
    }

    /// Rebuild a telegram from one complete frame (header included).
    pub fn from_frame(bytes: Vec<u8>) -> Result<Self, WireError> {
        let header = decode_header(&bytes)
            .ok_or(WireError::Truncated { expected: HEADER_SIZE, actual: bytes.len() })?;
        if header.frame_len() < HEADER_SIZE {
            return Err(WireError::InvalidLength { length: header.size, header: HEADER_SIZE });
        }
        if header.frame_len() != bytes.len() {
            return Err(WireError::Truncated { expected: header.frame_len(), actual: bytes.len() });
        }
        Ok(Self { code: header.code, bytes })
    }

    pub fn code(&self) -> TelegramCode {
        self.code
    }

    /// Total length including the header.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    /// The encoded frame, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn check_datagram(&self, max: usize) -> Result<(), WireError> {
        if self.size() > max {
            return Err(WireError::PayloadTooLarge { size: self.size(), max });
        }
        Ok(())
    }

    /// Decode a double-array payload.
    pub fn to_doubles(&self) -> Result<Vec<f64>, WireError> {
        let payload = self.payload();
        if payload.len() % 8 != 0 {
            return Err(WireError::MisalignedDoubles { len: payload.len() });
        }
        Ok(payload
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect())
    }

    /// Decode a text payload, ignoring trailing NUL terminators.
    pub fn to_text(&self) -> Result<&str, WireError> {
        let payload = self.payload();
        let end = payload.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        std::str::from_utf8(&payload[..end]).map_err(|_| WireError::InvalidText)
    }
}

#[cfg(test)]
#[path = "telegram_tests.rs"]
mod tests;
