// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Weak;

use crate::responder::{HandlerId, Inner};

/// Registration of one handler; dropping it unsubscribes.
///
/// Holds only a weak reference, so it neither keeps the responder alive nor
/// fails when the responder is already gone.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: String,
    handler: HandlerId,
    responder: Weak<Inner>,
}

impl Subscription {
    pub(crate) fn new(id: String, handler: HandlerId, responder: Weak<Inner>) -> Self {
        Self { id, handler, responder }
    }

    /// Message id this handler listens to.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.responder.upgrade() {
            inner.unsubscribe(&self.id, self.handler);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("handler", &self.handler)
            .field("live", &(self.responder.strong_count() > 0))
            .finish()
    }
}
