//! Invite pages: the superadmin listing and the redeem flow.
//!
//! Redeeming is a one-time side effect. The redeem page keeps an inline
//! "joined" confirmation instead of redirecting, and suppresses further
//! redeem attempts once one has succeeded.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Team, TeamInvite, TeamListEntry, TwitchUser, User};
use crate::services::{invites, teams, twitch};
use crate::views::fetch_current_user;

pub enum InvitesPage {
    NotLoggedIn,
    Ready {
        current_user: User,
        teams: Vec<TeamListEntry>,
        /// All open invites; empty for non-superadmins.
        invites: Vec<TeamInvite>,
        /// Twitch profiles of the invited users, for display next to each
        /// invite.
        invitees: Vec<TwitchUser>,
    },
}

pub struct InvitesView {
    client: Arc<ApiClient>,
    cache: QueryCache,
}

impl InvitesView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub async fn load(&self) -> Result<InvitesPage> {
        let current_user = match fetch_current_user(&self.client, &self.cache).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => return Ok(InvitesPage::NotLoggedIn),
            Err(e) => return Err(e),
        };
        let superadmin = current_user.is_superadmin;

        let teams_query = {
            let client = self.client.clone();
            self.cache.fetch(
                QueryKey::of("teams"),
                QueryOptions::default(),
                move || {
                    let client = client.clone();
                    async move { teams::get_teams(&client).await }
                },
            )
        };
        let invites_query = {
            let client = self.client.clone();
            self.cache.fetch(
                QueryKey::of("invites"),
                QueryOptions::no_retry().when(superadmin),
                move || {
                    let client = client.clone();
                    async move { invites::get_invites(&client).await }
                },
            )
        };
        let (teams, invites) = futures::join!(teams_query, invites_query);

        let teams = match teams {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Teams listing failed: {}", e);
                Vec::new()
            }
        };
        let invites: Vec<TeamInvite> = invites?.unwrap_or_default();

        // The invitee lookup only fires once the invites are in.
        let ids: BTreeSet<String> = invites
            .iter()
            .map(|i| i.user_twitch_id.clone())
            .collect();
        let invitees = {
            let client = self.client.clone();
            let ids = ids.clone();
            self.cache
                .fetch(
                    QueryKey::of("twitch_existing_users"),
                    QueryOptions::default().when(!ids.is_empty()),
                    move || {
                        let client = client.clone();
                        let ids = ids.clone();
                        async move {
                            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                            twitch::get_twitch_users_by_id(&client, &refs).await
                        }
                    },
                )
                .await?
                .map(|list| list.data)
                .unwrap_or_default()
        };

        Ok(InvitesPage::Ready {
            current_user,
            teams,
            invites,
            invitees,
        })
    }

    /// Withdraw an invite and refetch the listing and the invitee lookup.
    pub async fn delete(&self, uuid: Uuid) -> Result<TeamInvite> {
        self.cache
            .mutate(
                invites::delete_invite(&self.client, uuid),
                |_| None,
                &[
                    QueryKey::of("invites"),
                    QueryKey::of("twitch_existing_users"),
                ],
            )
            .await
    }
}

pub enum RedeemPage {
    /// Redeeming needs a session; the login URL redirects back here.
    NotLoggedIn { login_url: String },
    /// The invite is addressed to a different Twitch account. No redeem
    /// action is exposed.
    NotForYou { invite: TeamInvite },
    Ready {
        invite: TeamInvite,
        team: Option<Team>,
        /// Twitch profile of the invited account.
        invitee: Option<TwitchUser>,
        /// Set once a redeem has succeeded in this session.
        joined: bool,
    },
}

pub struct RedeemInviteView {
    client: Arc<ApiClient>,
    cache: QueryCache,
    uuid: Uuid,
    redeemed: bool,
}

impl RedeemInviteView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache, uuid: Uuid) -> Self {
        Self {
            client,
            cache,
            uuid,
            redeemed: false,
        }
    }

    pub async fn load(&self) -> Result<RedeemPage> {
        let current_user = match fetch_current_user(&self.client, &self.cache).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => {
                let redirect = format!("invites/redeem/{}", self.uuid);
                return Ok(RedeemPage::NotLoggedIn {
                    login_url: self.client.twitch_login_url(Some(&redirect)),
                });
            }
            Err(e) => return Err(e),
        };

        let invite = self.fetch_invite().await?;
        if invite.user_twitch_id != current_user.twitch_id {
            return Ok(RedeemPage::NotForYou { invite });
        }

        // Both lookups depend on the invite and fire together once it is in.
        let team_query = {
            let client = self.client.clone();
            let team_uuid = invite.team_uuid;
            self.cache.fetch(
                QueryKey::of("teams").with(team_uuid),
                QueryOptions::default(),
                move || {
                    let client = client.clone();
                    async move { teams::get_team(&client, team_uuid).await }
                },
            )
        };
        let invitee_query = {
            let client = self.client.clone();
            let twitch_id = invite.user_twitch_id.clone();
            self.cache.fetch(
                QueryKey::of("twitch_users").with(&invite.user_twitch_id),
                QueryOptions::default(),
                move || {
                    let client = client.clone();
                    let twitch_id = twitch_id.clone();
                    async move { twitch::get_twitch_users_by_id(&client, &[&twitch_id]).await }
                },
            )
        };
        let (team, invitee) = futures::join!(team_query, invitee_query);

        // Both are decoration; the redeem action stands without them.
        let team = match team {
            Ok(team) => team,
            Err(e) => {
                warn!("Team lookup failed: {}", e);
                None
            }
        };
        let invitee = match invitee {
            Ok(list) => list.and_then(|l| l.data.into_iter().next()),
            Err(e) => {
                warn!("Invitee lookup failed: {}", e);
                None
            }
        };

        Ok(RedeemPage::Ready {
            invite,
            team,
            invitee,
            joined: self.redeemed,
        })
    }

    /// Join the team. A second call in the same session is refused locally
    /// without touching the backend.
    pub async fn redeem(&mut self) -> Result<TeamInvite> {
        if self.redeemed {
            return Err(ApiError::Internal {
                message: "invite already redeemed".to_string(),
            });
        }

        let redeemed = self
            .cache
            .mutate(
                invites::redeem_invite(&self.client, self.uuid),
                |_| None,
                &[
                    QueryKey::of("invites"),
                    QueryKey::of("teams"),
                    crate::views::current_user_key(),
                ],
            )
            .await?;
        self.redeemed = true;
        Ok(redeemed)
    }

    async fn fetch_invite(&self) -> Result<TeamInvite> {
        let client = self.client.clone();
        let uuid = self.uuid;
        let invite = self
            .cache
            .fetch(
                QueryKey::of("invites").with(uuid),
                QueryOptions::no_retry(),
                move || {
                    let client = client.clone();
                    async move { invites::get_invite(&client, uuid).await }
                },
            )
            .await?;
        invite.ok_or_else(|| ApiError::Internal {
            message: "invite query unexpectedly disabled".to_string(),
        })
    }
}
