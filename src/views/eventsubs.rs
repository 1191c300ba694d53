//! Event subscription pages: listing + creation, and the detail page with
//! its derived Discord server/channel resolution.

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{DiscordChannel, DiscordServer, EventSubscription, User};
use crate::services::{discord, eventsubs, users};
use crate::views::fetch_current_user;

/// Resolve the Discord server an event subscription points at, then the
/// channel within it. Recomputed from the source queries on every call,
/// never cached; yields `None` where nothing matches.
pub fn resolve_target<'a>(
    sub: &EventSubscription,
    servers: &'a [DiscordServer],
) -> (Option<&'a DiscordServer>, Option<&'a DiscordChannel>) {
    let server = servers
        .iter()
        .find(|s| s.discord_id == sub.server_discord_id);
    let channel = server.and_then(|s| s.channel(&sub.channel_discord_id));
    (server, channel)
}

pub enum EventSubsPage {
    NotLoggedIn,
    /// The backend rejected the listing outright (HTTP 400).
    FeatureUnavailable,
    Ready {
        current_user: User,
        eventsubs: Vec<EventSubscription>,
        /// All users, for the superadmin's target-user picker.
        users: Vec<User>,
        /// Servers reachable by the linked bot; empty when Discord is not
        /// linked.
        discord_servers: Vec<DiscordServer>,
    },
}

pub struct EventSubsView {
    client: Arc<ApiClient>,
    cache: QueryCache,
}

impl EventSubsView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub async fn load(&self) -> Result<EventSubsPage> {
        let current_user = match fetch_current_user(&self.client, &self.cache).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => return Ok(EventSubsPage::NotLoggedIn),
            Err(e) => return Err(e),
        };

        let user_uuid = current_user.uuid;
        let superadmin = current_user.is_superadmin;
        let linked = current_user.discord_linked();

        // Sibling queries, fired concurrently. The latter two are gated on
        // what the current-user query exposed.
        let subs_query = {
            let client = self.client.clone();
            self.cache.fetch(
                QueryKey::of("eventsubs"),
                QueryOptions::default().when(user_uuid.is_some()),
                move || {
                    let client = client.clone();
                    async move {
                        if superadmin {
                            eventsubs::get_event_subs(&client).await
                        } else {
                            let uuid = user_uuid.ok_or_else(|| ApiError::Internal {
                                message: "eventsubs query ran without a user uuid".to_string(),
                            })?;
                            eventsubs::get_event_subs_by_user(&client, uuid).await
                        }
                    }
                },
            )
        };
        let users_query = {
            let client = self.client.clone();
            self.cache.fetch(
                QueryKey::of("users"),
                QueryOptions::no_retry().when(superadmin),
                move || {
                    let client = client.clone();
                    async move { users::get_users(&client).await }
                },
            )
        };
        let servers_query = {
            let client = self.client.clone();
            self.cache.fetch(
                QueryKey::of("discordServers"),
                QueryOptions::default().when(linked),
                move || {
                    let client = client.clone();
                    async move { discord::get_discord_servers(&client).await }
                },
            )
        };

        let (subs, users, servers) = futures::join!(subs_query, users_query, servers_query);

        let eventsubs = match subs {
            Ok(list) => list.unwrap_or_default(),
            Err(e) if e.is_bad_request() => return Ok(EventSubsPage::FeatureUnavailable),
            Err(e) => return Err(e),
        };

        // Secondary queries degrade to empty rather than failing the page.
        let users = match users {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Users listing failed: {}", e);
                Vec::new()
            }
        };
        let discord_servers = match servers {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Discord servers listing failed: {}", e);
                Vec::new()
            }
        };

        Ok(EventSubsPage::Ready {
            current_user,
            eventsubs,
            users,
            discord_servers,
        })
    }

    /// Delete a subscription and refetch both the listing and the entity.
    pub async fn delete(&self, uuid: Uuid) -> Result<EventSubscription> {
        self.cache
            .mutate(
                eventsubs::delete_event_sub(&self.client, uuid),
                |_| None,
                &[
                    QueryKey::of("eventsubs"),
                    QueryKey::of("eventsubs").with(uuid),
                ],
            )
            .await
    }
}

pub struct EventSubDetail {
    pub eventsub: EventSubscription,
    pub current_user: Option<User>,
    pub server: Option<DiscordServer>,
    pub channel: Option<DiscordChannel>,
}

pub struct EventSubDetailView {
    client: Arc<ApiClient>,
    cache: QueryCache,
    uuid: Uuid,
}

impl EventSubDetailView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache, uuid: Uuid) -> Self {
        Self {
            client,
            cache,
            uuid,
        }
    }

    pub async fn load(&self) -> Result<EventSubDetail> {
        let sub_query = {
            let client = self.client.clone();
            let uuid = self.uuid;
            self.cache.fetch(
                QueryKey::of("eventsubs").with(uuid),
                QueryOptions::no_retry(),
                move || {
                    let client = client.clone();
                    async move { eventsubs::get_event_sub(&client, uuid).await }
                },
            )
        };
        let (sub, current_user) =
            futures::join!(sub_query, fetch_current_user(&self.client, &self.cache));

        let eventsub: EventSubscription = sub?.ok_or_else(|| ApiError::Internal {
            message: "eventsub query unexpectedly disabled".to_string(),
        })?;
        let current_user = current_user.ok();

        // Servers are only reachable with a linked Discord account.
        let linked = current_user
            .as_ref()
            .is_some_and(|u| u.discord_linked());
        let servers: Vec<DiscordServer> = {
            let client = self.client.clone();
            self.cache
                .fetch(
                    QueryKey::of("discordServers"),
                    QueryOptions::default().when(linked),
                    move || {
                        let client = client.clone();
                        async move { discord::get_discord_servers(&client).await }
                    },
                )
                .await?
                .unwrap_or_default()
        };

        let (server, channel) = resolve_target(&eventsub, &servers);
        let server = server.cloned();
        let channel = channel.cloned();

        Ok(EventSubDetail {
            eventsub,
            current_user,
            server,
            channel,
        })
    }

    pub async fn delete(&self) -> Result<EventSubscription> {
        self.cache
            .mutate(
                eventsubs::delete_event_sub(&self.client, self.uuid),
                |_| None,
                &[
                    QueryKey::of("eventsubs"),
                    QueryKey::of("eventsubs").with(self.uuid),
                ],
            )
            .await
    }
}
