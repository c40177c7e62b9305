// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-level pub/sub and request/reply on top of the telegram transport.
//!
//! A [`MessageResponder`] routes inbound [`Message`]s by id to subscribed
//! handlers and to pending requests. It knows nothing about sockets: outbound
//! messages go through a send function, and [`pump`] / [`serve`] feed it from
//! an [`Endpoint`](hwb_transport::Endpoint).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod pump;
mod reply;
mod responder;
mod subscription;

pub use error::MessagingError;
pub use pump::{endpoint_sender, pump, serve, PumpReport};
pub use reply::{ReplyError, ReplyFuture};
pub use responder::{Dispatch, HandlerId, MessageResponder};
pub use subscription::Subscription;

pub use hwb_wire::Message;
