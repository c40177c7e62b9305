// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glue between an endpoint's receive queue and a responder.

use std::sync::Arc;

use hwb_transport::{CodeFilter, Endpoint, TelegramCode, TransportError};
use hwb_wire::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::MessagingError;
use crate::responder::MessageResponder;

/// Counts from one [`pump`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub dispatched: usize,
    /// Structured telegrams whose payload did not decode
    pub malformed: usize,
}

impl std::ops::AddAssign for PumpReport {
    fn add_assign(&mut self, other: Self) {
        self.dispatched += other.dispatched;
        self.malformed += other.malformed;
    }
}

/// Send function that serializes messages as `code` telegrams on `endpoint`.
pub fn endpoint_sender(
    endpoint: Arc<Endpoint>,
    code: TelegramCode,
) -> impl Fn(&Message) -> Result<(), MessagingError> + Send + Sync + 'static {
    move |message| {
        let telegram = message.to_telegram(code)?;
        endpoint.push_send(telegram)?;
        Ok(())
    }
}

/// Dispatch every queued command and status telegram. Never blocks.
///
/// Other telegram codes stay queued for their own consumers.
pub fn pump(endpoint: &Endpoint, responder: &MessageResponder) -> PumpReport {
    let mut report = PumpReport::default();
    for code in [TelegramCode::Command, TelegramCode::Status] {
        while let Some(telegram) = endpoint.pop_receive(CodeFilter::Only(code)) {
            report += dispatch(&telegram, responder);
        }
    }
    report
}

fn dispatch(telegram: &hwb_wire::Telegram, responder: &MessageResponder) -> PumpReport {
    match Message::from_telegram(telegram) {
        Ok(message) => {
            let outcome = responder.respond_to_message(&message);
            debug!(id = %message.id(), handled = outcome.handled, resolved = outcome.resolved, "dispatched");
            PumpReport { dispatched: 1, malformed: 0 }
        }
        Err(e) => {
            warn!(code = %telegram.code(), size = telegram.size(), error = %e, "undecodable message");
            PumpReport { dispatched: 0, malformed: 1 }
        }
    }
}

/// Dispatch command and status messages as they arrive until `cancel`
/// fires or the endpoint closes.
pub async fn serve(
    endpoint: Arc<Endpoint>,
    responder: MessageResponder,
    cancel: CancellationToken,
) -> Result<PumpReport, TransportError> {
    let mut total = PumpReport::default();
    loop {
        let telegram = tokio::select! {
            _ = cancel.cancelled() => break,
            received = endpoint.recv(CodeFilter::Only(TelegramCode::Command)) => received,
            received = endpoint.recv(CodeFilter::Only(TelegramCode::Status)) => received,
        };
        match telegram {
            Ok(telegram) => {
                total += dispatch(&telegram, &responder);
                total += pump(&endpoint, &responder);
            }
            Err(TransportError::NotOpen) if cancel.is_cancelled() => break,
            Err(e) => return Err(e),
        }
    }
    debug!(dispatched = total.dispatched, malformed = total.malformed, "message pump stopped");
    Ok(total)
}

#[cfg(test)]
#[path = "pump_tests.rs"]
mod tests;
