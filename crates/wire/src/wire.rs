// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async helpers for reading and writing telegrams on tokio streams.
//!
//! The bridge's own port workers use non-blocking std sockets; these helpers
//! serve async peers (controlling applications, tests) speaking the same format.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::code::TelegramCode;
use crate::error::WireError;
use crate::message::Message;
use crate::telegram::{decode_header, Telegram, HEADER_SIZE};

/// Errors from stream-level telegram I/O.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for telegram")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Write one telegram and flush.
pub async fn write_telegram<W>(writer: &mut W, telegram: &Telegram) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(telegram.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one telegram.
pub async fn read_telegram<R>(reader: &mut R) -> Result<Telegram, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    if let Err(e) = reader.read_exact(&mut header).await {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Err(ProtocolError::ConnectionClosed);
        }
        return Err(e.into());
    }

    let Some(parsed) = decode_header(&header) else {
        return Err(ProtocolError::ConnectionClosed);
    };
    if parsed.frame_len() < HEADER_SIZE {
        return Err(WireError::InvalidLength { length: parsed.size, header: HEADER_SIZE }.into());
    }

    let mut frame = vec![0u8; parsed.frame_len()];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_SIZE..]).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    })?;

    Ok(Telegram::from_frame(frame)?)
}

/// Read one telegram, giving up after `timeout`.
pub async fn read_telegram_timeout<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Telegram, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, read_telegram(reader)).await.map_err(|_| ProtocolError::Timeout)?
}

/// Serialize a message as a command telegram and write it.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let telegram = message.to_telegram(TelegramCode::Command)?;
    write_telegram(writer, &telegram).await
}

/// Read telegrams until a structured one arrives and decode it as a message.
///
/// Non-structured telegrams (samples, strings) read along the way are skipped.
pub async fn read_message<R>(reader: &mut R, timeout: Duration) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let read = async {
        loop {
            let telegram = read_telegram(reader).await?;
            if telegram.code().is_structured() {
                return Ok(Message::from_telegram(&telegram)?);
            }
        }
    };
    tokio::time::timeout(timeout, read).await.map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
