// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegram codes: the one-byte tag selecting how a payload is interpreted.

use std::fmt;

/// Byte reserved for the receive-side "any code" filter. Never sent.
pub const WILDCARD_CODE: u8 = 255;

/// Payload interpretation of a telegram.
///
/// Bytes outside the defined set are preserved as [`TelegramCode::Other`] so a
/// telegram from a newer peer survives a decode/encode cycle unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelegramCode {
    /// Little-endian `f64` values, back to back
    DoubleArray,
    /// Structured-text command (a serialized `Message`)
    Command,
    /// Structured-text status report
    Status,
    Configuration,
    /// NUL-terminated UTF-8 text
    String,
    Event,
    Interrupt,
    Warning,
    /// Oversized payload used by transport stress tests
    TestBig,
    /// Unset / invalid
    Invalid,
    Other(u8),
}

impl TelegramCode {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::DoubleArray => 0,
            Self::Command => 1,
            Self::Status => 2,
            Self::Configuration => 3,
            Self::String => 4,
            Self::Event => 5,
            Self::Interrupt => 6,
            Self::Warning => 7,
            Self::TestBig => 10,
            Self::Invalid => 100,
            Self::Other(byte) => byte,
        }
    }

    pub const fn from_u8(byte: u8) -> Self {
        match byte {
            0 => Self::DoubleArray,
            1 => Self::Command,
            2 => Self::Status,
            3 => Self::Configuration,
            4 => Self::String,
            5 => Self::Event,
            6 => Self::Interrupt,
            7 => Self::Warning,
            10 => Self::TestBig,
            100 => Self::Invalid,
            other => Self::Other(other),
        }
    }

    /// Whether the payload carries structured text (a serialized message).
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Command | Self::Status)
    }
}

impl From<u8> for TelegramCode {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelegramCode> for u8 {
    fn from(code: TelegramCode) -> Self {
        code.as_u8()
    }
}

impl fmt::Display for TelegramCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleArray => f.write_str("double-array"),
            Self::Command => f.write_str("command"),
            Self::Status => f.write_str("status"),
            Self::Configuration => f.write_str("configuration"),
            Self::String => f.write_str("string"),
            Self::Event => f.write_str("event"),
            Self::Interrupt => f.write_str("interrupt"),
            Self::Warning => f.write_str("warning"),
            Self::TestBig => f.write_str("test-big"),
            Self::Invalid => f.write_str("invalid"),
            Self::Other(byte) => write!(f, "code-{}", byte),
        }
    }
}

/// Receive-side selection of telegrams by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeFilter {
    /// Match every telegram
    #[default]
    Any,
    /// Match only telegrams carrying this code
    Only(TelegramCode),
}

impl CodeFilter {
    pub fn matches(self, code: TelegramCode) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted == code,
        }
    }

    /// Interpret a raw filter byte, treating [`WILDCARD_CODE`] as "any".
    pub fn from_u8(byte: u8) -> Self {
        if byte == WILDCARD_CODE {
            Self::Any
        } else {
            Self::Only(TelegramCode::from_u8(byte))
        }
    }
}

impl From<TelegramCode> for CodeFilter {
    fn from(code: TelegramCode) -> Self {
        Self::Only(code)
    }
}

#[cfg(test)]
#[path = "code_tests.rs"]
mod tests;
