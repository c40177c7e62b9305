// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message responder: id-keyed handlers plus request/reply correlation.
//!
//! The handler map and the pending-request map each have their own lock.
//! Handlers, reply continuations and the send function are always invoked
//! with no lock held, so any of them may subscribe, unsubscribe or send.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hwb_wire::Message;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::MessagingError;
use crate::reply::ReplyFuture;
use crate::subscription::Subscription;

/// Identifies one subscribed handler; unique per responder.
pub type HandlerId = u64;

type Handler = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;
type SendFn = Arc<dyn Fn(&Message) -> Result<(), MessagingError> + Send + Sync>;
type Continuation = Box<dyn FnOnce(&Message) + Send>;

struct Pending {
    reply: oneshot::Sender<Message>,
    continuation: Option<Continuation>,
}

/// Outcome of dispatching one inbound message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Handlers invoked
    pub handled: usize,
    /// Handler replies handed to the send function
    pub replies: usize,
    /// Whether a pending request was resolved
    pub resolved: bool,
}

pub(crate) struct Inner {
    handlers: Mutex<HashMap<String, Vec<(HandlerId, Handler)>>>,
    pending: Mutex<HashMap<String, Pending>>,
    send: Mutex<Option<SendFn>>,
    next_handler: AtomicU64,
}

impl Inner {
    /// Idempotent; drops the id's entry once its last handler is gone.
    pub(crate) fn unsubscribe(&self, id: &str, handler: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(id) else {
            return false;
        };
        let before = list.len();
        list.retain(|(h, _)| *h != handler);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(id);
        }
        removed
    }
}

/// Pub/sub and request/reply hub. Clones share the same state.
#[derive(Clone)]
pub struct MessageResponder {
    inner: Arc<Inner>,
}

impl Default for MessageResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageResponder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                handlers: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                send: Mutex::new(None),
                next_handler: AtomicU64::new(1),
            }),
        }
    }

    /// Invoke `handler` for every dispatched message with this id.
    ///
    /// A returned message is sent as the reply. The handler stays registered
    /// for as long as the returned [`Subscription`] lives.
    pub fn subscribe<F>(&self, id: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        let id = id.into();
        let handler_id = self.inner.next_handler.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .entry(id.clone())
            .or_default()
            .push((handler_id, Arc::new(handler)));
        debug!(id = %id, handler = handler_id, "subscribed");
        Subscription::new(id, handler_id, Arc::downgrade(&self.inner))
    }

    /// Remove one handler. Returns whether it was still registered.
    pub fn unsubscribe(&self, id: &str, handler: HandlerId) -> bool {
        self.inner.unsubscribe(id, handler)
    }

    pub fn handler_count(&self, id: &str) -> usize {
        self.inner.handlers.lock().get(id).map_or(0, Vec::len)
    }

    /// Route one inbound message: subscribed handlers first, then the
    /// pending request waiting on its id, if any.
    pub fn respond_to_message(&self, message: &Message) -> Dispatch {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .get(message.id())
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        let mut dispatch = Dispatch { handled: handlers.len(), ..Dispatch::default() };
        for handler in handlers {
            if let Some(reply) = handler(message) {
                match self.send_message(&reply) {
                    Ok(()) => dispatch.replies += 1,
                    Err(e) => warn!(id = %reply.id(), error = %e, "reply not sent"),
                }
            }
        }

        let pending = self.inner.pending.lock().remove(message.id());
        if let Some(Pending { reply, continuation }) = pending {
            if let Some(continuation) = continuation {
                continuation(message);
            }
            // The caller may have dropped the future; the reply is still consumed
            let _ = reply.send(message.clone());
            dispatch.resolved = true;
        }

        dispatch
    }

    /// Install the transport callback used for every outbound message.
    pub fn set_send_function<F>(&self, send: F)
    where
        F: Fn(&Message) -> Result<(), MessagingError> + Send + Sync + 'static,
    {
        *self.inner.send.lock() = Some(Arc::new(send));
    }

    pub fn clear_send_function(&self) {
        *self.inner.send.lock() = None;
    }

    pub fn send_message(&self, message: &Message) -> Result<(), MessagingError> {
        let send = self.inner.send.lock().clone();
        match send {
            Some(send) => send(message),
            None => {
                warn!(id = %message.id(), "no send function configured, dropping message");
                Err(MessagingError::NoSendFunction)
            }
        }
    }

    /// Send `message` and return a future resolving with the next inbound
    /// message carrying the same id.
    pub fn send_request(&self, message: Message) -> Result<ReplyFuture, MessagingError> {
        self.register_and_send(message, None)
    }

    /// Like [`Self::send_request`], additionally calling `handler` with the reply.
    pub fn send_request_with<F>(&self, message: Message, handler: F) -> Result<ReplyFuture, MessagingError>
    where
        F: FnOnce(&Message) + Send + 'static,
    {
        self.register_and_send(message, Some(Box::new(handler)))
    }

    fn register_and_send(
        &self,
        message: Message,
        continuation: Option<Continuation>,
    ) -> Result<ReplyFuture, MessagingError> {
        let id = message.id().to_owned();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.inner.pending.lock();
            if pending.contains_key(&id) {
                debug!(id = %id, "duplicate request rejected");
                return Err(MessagingError::DuplicateRequestId(id));
            }
            pending.insert(id.clone(), Pending { reply: tx, continuation });
        }

        // Registered before sending: a fast reply must find its request
        if let Err(e) = self.send_message(&message) {
            self.inner.pending.lock().remove(&id);
            return Err(e);
        }
        Ok(ReplyFuture::new(id, rx))
    }

    /// Forget a pending request; its future resolves with an error.
    ///
    /// Pending requests never expire on their own.
    pub fn cancel_request(&self, id: &str) -> bool {
        self.inner.pending.lock().remove(id).is_some()
    }

    /// Ids of requests still waiting for a reply, sorted.
    pub fn pending_requests(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.pending.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for MessageResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.inner.handlers.lock().len();
        f.debug_struct("MessageResponder")
            .field("subscribed_ids", &handlers)
            .field("pending", &self.pending_requests())
            .finish()
    }
}

#[cfg(test)]
#[path = "responder_tests.rs"]
mod tests;
