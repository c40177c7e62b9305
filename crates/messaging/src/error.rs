// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hwb_transport::TransportError;
use hwb_wire::WireError;
use thiserror::Error;

/// Errors from the messaging layer.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// A request with this id is already waiting for its reply
    #[error("request {0:?} is already pending")]
    DuplicateRequestId(String),

    /// Local misconfiguration; the message was dropped
    #[error("no send function configured")]
    NoSendFunction,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wire(#[from] WireError),
}
