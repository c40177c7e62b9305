// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accumulation buffer that turns a byte stream into whole telegrams.

use crate::error::WireError;
use crate::telegram::{decode_header, Telegram, HEADER_SIZE};

/// Received-but-not-yet-framed bytes for one stream.
///
/// The buffer grows only by [`FrameBuffer::extend`] and shrinks only by the
/// exact length of a telegram handed out by [`FrameBuffer::extract`].
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    /// Size of the telegram being assembled, 0 until its header arrived
    current: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Split off the next complete telegram, if one is buffered.
    ///
    /// Call repeatedly until it returns `Ok(None)`: one read may carry several
    /// telegrams. An `Err` means the stream is corrupt and cannot be resynced.
    pub fn extract(&mut self) -> Result<Option<Telegram>, WireError> {
        if self.current == 0 {
            let Some(header) = decode_header(&self.buf) else {
                return Ok(None);
            };
            if header.frame_len() < HEADER_SIZE {
                return Err(WireError::InvalidLength { length: header.size, header: HEADER_SIZE });
            }
            self.current = header.frame_len();
        }

        if self.buf.len() < self.current {
            return Ok(None);
        }

        let rest = self.buf.split_off(self.current);
        let frame = std::mem::replace(&mut self.buf, rest);
        self.current = 0;
        Telegram::from_frame(frame).map(Some)
    }

    /// Bytes held that do not yet form a complete telegram.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Size of the telegram currently being assembled (0 if none started).
    pub fn current_size(&self) -> usize {
        self.current
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
