// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Party-checked access to an application's chat log and live feed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::SubsecRound;
use serde::Serialize;
use tracing::{debug, info, warn};

use haven_core::{
    system_clock, Application, ApplicationFilter, ApplicationId, ChatMessage, Clock, HavenError,
    MessageId, MessageSubscription, Party, StorageAdapter, UserId,
};

/// A counterpart the viewer has a channel with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatContact {
    /// The other party's user id.
    pub id: UserId,
    pub name: String,
    /// Application whose channel this contact opens.
    pub application_id: ApplicationId,
    pub last_message: Option<String>,
}

/// Chat between the adopter and the shelter of one application.
pub struct MessagingChannel {
    storage: Arc<dyn StorageAdapter>,
    clock: Clock,
}

impl MessagingChannel {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            clock: system_clock(),
        }
    }

    /// Replace the time source used to stamp new messages.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// All messages for the application, oldest first.
    pub async fn list_messages(
        &self,
        actor: &UserId,
        application_id: &ApplicationId,
    ) -> Result<Vec<ChatMessage>, HavenError> {
        self.authorize(actor, application_id).await?;
        self.storage.list_messages(application_id).await
    }

    /// Post `text` as `actor`. The stored text is trimmed.
    pub async fn send(
        &self,
        actor: &UserId,
        application_id: &ApplicationId,
        text: &str,
    ) -> Result<ChatMessage, HavenError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HavenError::EmptyMessage);
        }
        self.authorize(actor, application_id).await?;

        let message = ChatMessage {
            id: MessageId::generate(),
            application_id: application_id.clone(),
            sender_id: actor.clone(),
            message: text.to_string(),
            created_at: (self.clock)().trunc_subsecs(3),
        };
        self.storage
            .insert_message(&message)
            .await
            .inspect_err(|e| {
                warn!(application_id = %application_id, sender_id = %actor, error = %e, "message insert failed");
            })?;

        info!(
            application_id = %application_id,
            message_id = %message.id,
            sender_id = %actor,
            "message sent"
        );
        Ok(message)
    }

    /// One contact per counterpart across the viewer's applications.
    ///
    /// Shelters see adopters by full name; adopters see shelters by their
    /// shelter name, falling back to the full name. When several
    /// applications share a counterpart, the newest one opens the channel.
    pub async fn list_contacts(&self, viewer: &Party) -> Result<Vec<ChatContact>, HavenError> {
        let applications = self
            .storage
            .list_applications(&ApplicationFilter {
                party: viewer.clone(),
                status: None,
            })
            .await?;

        let mut seen = HashSet::new();
        let mut contacts = Vec::new();
        for application in applications {
            let counterpart = match viewer {
                Party::Shelter(_) => application.adopter_id,
                Party::Adopter(_) => application.shelter_id,
            };
            if !seen.insert(counterpart.clone()) {
                continue;
            }

            let name = match self.storage.get_profile(&counterpart).await? {
                Some(profile) => match viewer {
                    Party::Shelter(_) => profile.full_name,
                    Party::Adopter(_) => profile.display_shelter_name().to_string(),
                },
                None => counterpart.to_string(),
            };
            let last_message = self
                .storage
                .list_messages(&application.id)
                .await?
                .pop()
                .map(|m| m.message);

            contacts.push(ChatContact {
                id: counterpart,
                name,
                application_id: application.id,
                last_message,
            });
        }

        debug!(viewer = %viewer.user_id(), contacts = contacts.len(), "listed chat contacts");
        Ok(contacts)
    }

    /// Open a live feed of messages posted to the application from now on.
    ///
    /// The caller owns the subscription and should [`close`] it when done.
    ///
    /// [`close`]: MessageSubscription::close
    pub async fn subscribe(
        &self,
        actor: &UserId,
        application_id: &ApplicationId,
    ) -> Result<MessageSubscription, HavenError> {
        self.authorize(actor, application_id).await?;
        debug!(application_id = %application_id, subscriber = %actor, "message subscription opened");
        Ok(self.storage.subscribe_messages(application_id))
    }

    async fn authorize(
        &self,
        actor: &UserId,
        application_id: &ApplicationId,
    ) -> Result<Application, HavenError> {
        let application = self
            .storage
            .get_application(application_id)
            .await?
            .ok_or_else(|| HavenError::not_found("application", application_id))?;
        if !application.is_party(actor) {
            warn!(application_id = %application_id, actor = %actor, "message access refused");
            return Err(HavenError::Unauthorized(
                "not a party to this application".to_string(),
            ));
        }
        Ok(application)
    }
}
