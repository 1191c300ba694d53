//! Team creation form (superadmin only).

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::error::Result;
use crate::forms::{require, FormPhase};
use crate::models::Team;
use crate::services::teams;

#[derive(Default)]
pub struct TeamForm {
    pub phase: FormPhase,
    pub name: String,
    pub description: String,
    pub error: Option<crate::error::ApiError>,
}

impl TeamForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        if matches!(
            self.phase,
            FormPhase::Idle | FormPhase::Success | FormPhase::Failed
        ) {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        if matches!(
            self.phase,
            FormPhase::Idle | FormPhase::Success | FormPhase::Failed
        ) {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("name", !self.name.is_empty())?;
        require("description", !self.description.is_empty())?;
        Ok(())
    }

    pub async fn submit(&mut self, client: &ApiClient, cache: &QueryCache) -> Result<Team> {
        let payload = match self.validate() {
            Ok(()) => Team {
                uuid: None,
                name: self.name.clone(),
                description: self.description.clone(),
                members: Vec::new(),
                created_on: None,
                updated_on: None,
            },
            Err(e) => {
                self.error = Some(e.cloned());
                self.phase = FormPhase::Editing;
                return Err(e);
            }
        };

        self.phase = FormPhase::Submitting;
        let result = cache
            .mutate(
                teams::create_team(client, &payload),
                |team: &Team| team.uuid.map(|u| QueryKey::of("teams").with(u)),
                &[QueryKey::of("teams")],
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
}
