//! Event subscription creation form.

use tracing::debug;

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::forms::{require, FormPhase};
use crate::models::{
    is_event_type, DiscordChannel, DiscordRole, DiscordServer, EventSubscription, User,
};
use crate::services::eventsubs;

/// Compose the notification message from the selected role and free text:
/// `"{mention} {message}"` when both are present, whichever is present when
/// only one is, the empty string otherwise.
pub fn compose_message(role: Option<&DiscordRole>, message: &str) -> String {
    match (role, message.is_empty()) {
        (Some(role), false) => format!("{} {}", role.mention, message),
        (Some(role), true) => role.mention.clone(),
        (None, false) => message.to_string(),
        (None, true) => String::new(),
    }
}

pub struct EventSubForm {
    pub phase: FormPhase,
    /// Explicit target user; superadmins may subscribe on behalf of others.
    /// Defaults to the current user when unset.
    pub user: Option<User>,
    pub event: String,
    pub server: Option<DiscordServer>,
    pub channel: Option<DiscordChannel>,
    pub role: Option<DiscordRole>,
    pub message: String,
    pub title: String,
    pub description: String,
    pub error: Option<ApiError>,
}

impl Default for EventSubForm {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubForm {
    pub fn new() -> Self {
        Self {
            phase: FormPhase::Idle,
            user: None,
            event: String::new(),
            server: None,
            channel: None,
            role: None,
            message: String::new(),
            title: String::new(),
            description: String::new(),
            error: None,
        }
    }

    /// Mark the form as touched by the user. A settled submit (success or
    /// failure) returns to editing on the next touch; a failure keeps the
    /// field values intact.
    pub fn edit(&mut self) {
        if matches!(
            self.phase,
            FormPhase::Idle | FormPhase::Success | FormPhase::Failed
        ) {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn set_event(&mut self, event: impl Into<String>) {
        self.event = event.into();
        self.edit();
    }

    pub fn set_server(&mut self, server: DiscordServer) {
        // Channel and role belong to the previously selected server.
        self.channel = None;
        self.role = None;
        self.server = Some(server);
        self.edit();
    }

    /// Channels selectable for the chosen server. Client-side filtering only.
    pub fn channel_options(&self) -> &[DiscordChannel] {
        self.server.as_ref().map(|s| s.channels.as_slice()).unwrap_or(&[])
    }

    /// Roles selectable for the chosen server.
    pub fn role_options(&self) -> &[DiscordRole] {
        self.server.as_ref().map(|s| s.roles.as_slice()).unwrap_or(&[])
    }

    pub fn select_channel(&mut self, discord_id: &str) -> bool {
        let found = self
            .server
            .as_ref()
            .and_then(|s| s.channel(discord_id))
            .cloned();
        self.edit();
        match found {
            Some(channel) => {
                self.channel = Some(channel);
                true
            }
            None => false,
        }
    }

    pub fn select_role(&mut self, discord_id: &str) -> bool {
        let found = self
            .server
            .as_ref()
            .and_then(|s| s.role(discord_id))
            .cloned();
        self.edit();
        match found {
            Some(role) => {
                self.role = Some(role);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("event", !self.event.is_empty())?;
        if !is_event_type(&self.event) {
            return Err(ApiError::UnknownEvent {
                event: self.event.clone(),
            });
        }
        require("server", self.server.is_some())?;
        require("channel", self.channel.is_some())?;
        require("role", self.role.is_some())?;
        Ok(())
    }

    /// Assemble the create payload from the current fields, defaulting the
    /// target user to `current_user`.
    pub fn payload(&self, current_user: &User) -> Result<EventSubscription> {
        self.validate()?;

        let user = self.user.as_ref().unwrap_or(current_user);
        let user_uuid = user.uuid.ok_or_else(|| ApiError::MissingField {
            field: "user.uuid".to_string(),
        })?;

        Ok(EventSubscription {
            uuid: None,
            user_uuid,
            server_discord_id: self
                .server
                .as_ref()
                .map(|s| s.discord_id.clone())
                .unwrap_or_default(),
            channel_discord_id: self
                .channel
                .as_ref()
                .map(|c| c.discord_id.clone())
                .unwrap_or_default(),
            event: self.event.clone(),
            twitch_id: None,
            custom_title: self.title.clone(),
            custom_description: self.description.clone(),
            message: compose_message(self.role.as_ref(), &self.message),
            created_on: None,
            updated_on: None,
        })
    }

    /// Submit the form. On success the subscription's own key is seeded, the
    /// eventsubs keys are invalidated and the form resets to defaults. On
    /// failure the fields are kept and the form returns to editing.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        cache: &QueryCache,
        current_user: &User,
    ) -> Result<EventSubscription> {
        let payload = match self.payload(current_user) {
            Ok(payload) => payload,
            Err(e) => {
                self.error = Some(e.cloned());
                self.phase = FormPhase::Editing;
                return Err(e);
            }
        };

        self.phase = FormPhase::Submitting;
        let result = cache
            .mutate(
                eventsubs::create_event_sub(client, &payload),
                |sub: &EventSubscription| sub.uuid.map(|u| QueryKey::of("eventsubs").with(u)),
                &[QueryKey::of("eventsubs")],
            )
            .await;

        match result {
            Ok(created) => {
                debug!("Created event subscription {:?}", created.uuid);
                *self = Self::new();
                self.phase = FormPhase::Success;
                Ok(created)
            }
            Err(e) => {
                // Keep the field values; the next edit returns to editing.
                self.error = Some(e.cloned());
                self.phase = FormPhase::Failed;
                Err(e)
            }
        }
    }
}
