// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Awaitable side of a pending request.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use hwb_wire::Message;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    /// The request was cancelled or its responder dropped before a reply came
    #[error("request {0:?} closed without a reply")]
    Closed(String),
}

/// Resolves with the first inbound message carrying the request's id.
///
/// There is no built-in timeout; wrap it in `tokio::time::timeout` and call
/// [`MessageResponder::cancel_request`](crate::MessageResponder::cancel_request)
/// when giving up.
#[derive(Debug)]
pub struct ReplyFuture {
    id: String,
    rx: oneshot::Receiver<Message>,
}

impl ReplyFuture {
    pub(crate) fn new(id: String, rx: oneshot::Receiver<Message>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for ReplyFuture {
    type Output = Result<Message, ReplyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(message)) => Poll::Ready(Ok(message)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ReplyError::Closed(self.id.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
