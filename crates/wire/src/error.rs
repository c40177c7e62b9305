// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from telegram encoding and payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("payload too large: {size} bytes exceeds datagram limit of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("invalid telegram length {length} (header alone is {header} bytes)")]
    InvalidLength { length: u32, header: usize },

    #[error("telegram of {size} bytes does not fit the 32-bit size field")]
    Oversized { size: usize },

    #[error("code {code} is reserved for receive filters and cannot be sent")]
    ReservedCode { code: u8 },

    #[error("frame is truncated: header says {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("double-array payload of {len} bytes is not a multiple of 8")]
    MisalignedDoubles { len: usize },

    #[error("text payload is not valid UTF-8")]
    InvalidText,

    #[error("frame decode error: {0}")]
    FrameDecode(String),
}
