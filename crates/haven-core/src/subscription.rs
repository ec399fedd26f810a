// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live push subscription for messages inserted into one application's channel.
//!
//! The persistence gateway owns a broadcast feed of every inserted message.
//! A [`MessageSubscription`] filters that feed down to a single application
//! id. Closing is explicit and idempotent; once closed, no further messages
//! are delivered.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::types::{ApplicationId, ChatMessage};

/// Cancellable stream of newly inserted messages for one application.
#[derive(Debug)]
pub struct MessageSubscription {
    application_id: ApplicationId,
    receiver: Option<broadcast::Receiver<ChatMessage>>,
}

impl MessageSubscription {
    /// Scope `receiver` to messages for `application_id`.
    pub fn new(application_id: ApplicationId, receiver: broadcast::Receiver<ChatMessage>) -> Self {
        Self {
            application_id,
            receiver: Some(receiver),
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Wait for the next message in this application's channel.
    ///
    /// Returns `None` once the subscription is closed or the feed has shut down.
    /// If the subscriber fell behind the feed's buffer, the dropped messages
    /// are skipped and delivery resumes with the oldest retained one.
    pub async fn next(&mut self) -> Option<ChatMessage> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(message) if message.application_id == self.application_id => {
                    return Some(message);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        application_id = %self.application_id,
                        skipped,
                        "message subscriber lagged; skipped messages"
                    );
                }
                Err(RecvError::Closed) => {
                    debug!(application_id = %self.application_id, "message feed closed");
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Stop receiving. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            debug!(application_id = %self.application_id, "message subscription closed");
        }
    }
}
