// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events stream for an application's messaging channel.
//!
//! Each newly inserted message is pushed as:
//! ```text
//! event: message
//! data: {"id": "...", "application_id": "...", "sender_id": "...", "message": "...", "created_at": "..."}
//! ```
//!
//! The underlying subscription is closed when the client disconnects and the
//! stream is dropped.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::{self, Stream};

use haven_core::{ApplicationId, MessageSubscription};

use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Ends the subscription when the response stream is dropped.
struct ClosingSubscription(MessageSubscription);

impl Drop for ClosingSubscription {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// GET /v1/applications/{id}/messages/stream
pub async fn stream_messages(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state
        .messaging
        .subscribe(&actor, &ApplicationId::from(id))
        .await?;

    let events = stream::unfold(
        ClosingSubscription(subscription),
        |mut sub| async move {
            let message = sub.0.next().await?;
            let event = Event::default().event("message").json_data(&message);
            Some((event, sub))
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
