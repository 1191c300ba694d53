//! Team invite creation form.
//!
//! The invitee is resolved through an explicit Twitch lookup: the search
//! never runs on its own, only when asked for.

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::forms::{require, FormPhase};
use crate::models::{Team, TeamInvite, TwitchUser};
use crate::services::{invites, twitch};

#[derive(Default)]
pub struct InviteForm {
    pub phase: FormPhase,
    pub team: Option<Team>,
    pub login: String,
    /// Search hits for the current login text.
    pub candidates: Vec<TwitchUser>,
    /// The invitee picked from the candidates.
    pub selected: Option<TwitchUser>,
    pub error: Option<ApiError>,
}

impl InviteForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_team(&mut self, team: Team) {
        self.team = Some(team);
        if matches!(
            self.phase,
            FormPhase::Idle | FormPhase::Success | FormPhase::Failed
        ) {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn set_login(&mut self, login: impl Into<String>) {
        self.login = login.into();
        if matches!(
            self.phase,
            FormPhase::Idle | FormPhase::Success | FormPhase::Failed
        ) {
            self.phase = FormPhase::Editing;
        }
    }

    /// Manual Twitch lookup of the entered login. Fills `candidates`.
    pub async fn search(&mut self, client: &ApiClient) -> Result<()> {
        let login = self.login.trim().to_string();
        require("login", !login.is_empty())?;
        let found = twitch::get_twitch_users(client, &[&login]).await?;
        self.candidates = found.data;
        Ok(())
    }

    pub fn select(&mut self, twitch_id: &str) -> bool {
        match self.candidates.iter().find(|u| u.id == twitch_id).cloned() {
            Some(user) => {
                self.selected = Some(user);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("team", self.team.is_some())?;
        require("twitch_user", self.selected.is_some())?;
        Ok(())
    }

    pub async fn submit(&mut self, client: &ApiClient, cache: &QueryCache) -> Result<TeamInvite> {
        let payload = match self.build_payload() {
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
                invites::create_invite(client, &payload),
                |invite: &TeamInvite| invite.uuid.map(|u| QueryKey::of("invites").with(u)),
                &[
                    QueryKey::of("invites"),
                    QueryKey::of("twitch_existing_users"),
                ],
            )
            .await;

        match result {
            Ok(created) => {
                *self = Self::new();
                self.phase = FormPhase::Success;
                Ok(created)
            }
            Err(e) => {
                self.error = Some(e.cloned());
                self.phase = FormPhase::Failed;
                Err(e)
            }
        }
    }

    fn build_payload(&self) -> Result<TeamInvite> {
        self.validate()?;
        let team = self.team.as_ref().ok_or_else(|| ApiError::MissingField {
            field: "team".to_string(),
        })?;
        let team_uuid = team.uuid.ok_or_else(|| ApiError::MissingField {
            field: "team.uuid".to_string(),
        })?;
        let selected = self.selected.as_ref().ok_or_else(|| ApiError::MissingField {
            field: "twitch_user".to_string(),
        })?;

        Ok(TeamInvite {
            uuid: None,
            team_uuid,
            user_twitch_id: selected.id.clone(),
            created_on: None,
            updated_on: None,
        })
    }
}
