//! Team pages: the listing (union of bare teams and memberships) and the
//! per-team detail with its member roster.

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Membership, Team, TeamListEntry, User};
use crate::services::teams;
use crate::views::fetch_current_user;

pub enum TeamsPage {
    NotLoggedIn,
    Ready {
        current_user: User,
        /// Bare teams for superadmins, the caller's memberships otherwise.
        teams: Vec<TeamListEntry>,
    },
}

pub struct TeamsView {
    client: Arc<ApiClient>,
    cache: QueryCache,
}

impl TeamsView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub async fn load(&self) -> Result<TeamsPage> {
        let current_user = match fetch_current_user(&self.client, &self.cache).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => return Ok(TeamsPage::NotLoggedIn),
            Err(e) => return Err(e),
        };

        let teams = {
            let client = self.client.clone();
            self.cache
                .fetch(
                    QueryKey::of("teams"),
                    QueryOptions::default(),
                    move || {
                        let client = client.clone();
                        async move { teams::get_teams(&client).await }
                    },
                )
                .await?
                .unwrap_or_default()
        };

        Ok(TeamsPage::Ready {
            current_user,
            teams,
        })
    }

    /// Delete a team and refetch both the listing and the entity.
    pub async fn delete(&self, uuid: Uuid) -> Result<Team> {
        self.cache
            .mutate(
                teams::delete_team(&self.client, uuid),
                |_| None,
                &[QueryKey::of("teams"), QueryKey::of("teams").with(uuid)],
            )
            .await
    }
}

pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<Membership>,
    pub current_user: Option<User>,
}

pub struct TeamDetailView {
    client: Arc<ApiClient>,
    cache: QueryCache,
    uuid: Uuid,
}

impl TeamDetailView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache, uuid: Uuid) -> Self {
        Self {
            client,
            cache,
            uuid,
        }
    }

    pub async fn load(&self) -> Result<TeamDetail> {
        let team_query = {
            let client = self.client.clone();
            let uuid = self.uuid;
            self.cache.fetch(
                QueryKey::of("teams").with(uuid),
                QueryOptions::no_retry(),
                move || {
                    let client = client.clone();
                    async move { teams::get_team(&client, uuid).await }
                },
            )
        };
        let members_query = {
            let client = self.client.clone();
            let uuid = self.uuid;
            self.cache.fetch(
                QueryKey::of("teams").with(uuid).with("members"),
                QueryOptions::default(),
                move || {
                    let client = client.clone();
                    async move { teams::get_members(&client, uuid).await }
                },
            )
        };
        let (team, members, current_user) = futures::join!(
            team_query,
            members_query,
            fetch_current_user(&self.client, &self.cache)
        );

        let team: Team = team?.ok_or_else(|| ApiError::Internal {
            message: "team query unexpectedly disabled".to_string(),
        })?;

        // The roster degrades to empty rather than failing the page.
        let members = match members {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Member listing failed: {}", e);
                Vec::new()
            }
        };

        Ok(TeamDetail {
            team,
            members,
            current_user: current_user.ok(),
        })
    }

    /// Remove a member and refetch the roster and the team.
    pub async fn remove_member(&self, user_uuid: Uuid) -> Result<Membership> {
        self.cache
            .mutate(
                teams::delete_member(&self.client, self.uuid, user_uuid),
                |_| None,
                &[QueryKey::of("teams").with(self.uuid)],
            )
            .await
    }

    pub async fn delete(&self) -> Result<Team> {
        self.cache
            .mutate(
                teams::delete_team(&self.client, self.uuid),
                |_| None,
                &[
                    QueryKey::of("teams"),
                    QueryKey::of("teams").with(self.uuid),
                ],
            )
            .await
    }
}
