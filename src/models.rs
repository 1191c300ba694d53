//! Backend entities, exchanged verbatim as JSON.
//!
//! `uuid`, `created_on` and `updated_on` are assigned by the server and never
//! written by the client; they are absent on create payloads.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A platform user, backed by a Twitch account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    pub twitch_id: String,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Present once the user has linked a Discord account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,

    #[serde(default)]
    pub is_superadmin: bool,

    /// Memberships of this user, with the team embedded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<Membership>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
}

impl User {
    /// Whether a Discord account is linked to this user.
    pub fn discord_linked(&self) -> bool {
        self.discord_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    pub name: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<User>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
}

/// Join entity between a user and a team.
///
/// The backend embeds the joined `team` and `user` records where the caller
/// needs them (user detail, member listings).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    pub team_uuid: Uuid,
    pub user_uuid: Uuid,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub allowed_invites: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
}

/// One entry of the teams listing.
///
/// The backend returns either bare teams (superadmin) or the caller's
/// memberships. A membership always carries `team_uuid` + `user_uuid`, which
/// a bare team never has, so the membership variant is tried first. Use
/// [`TeamListEntry::team`] instead of probing fields at call sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TeamListEntry {
    Membership(Membership),
    Team(Team),
}

impl TeamListEntry {
    /// The team this entry refers to, if it is resolvable.
    pub fn team(&self) -> Option<&Team> {
        match self {
            TeamListEntry::Membership(m) => m.team.as_ref(),
            TeamListEntry::Team(t) => Some(t),
        }
    }

    pub fn is_membership(&self) -> bool {
        matches!(self, TeamListEntry::Membership(_))
    }
}

/// A one-time invitation of a Twitch user into a team.
///
/// Redeemable only by the user whose `twitch_id` equals `user_twitch_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamInvite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    pub team_uuid: Uuid,
    pub user_twitch_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
}

/// Relay of one Twitch event type to one Discord channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventSubscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    pub user_uuid: Uuid,
    pub server_discord_id: String,
    pub channel_discord_id: String,

    /// One of [`EVENT_TYPES`].
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_id: Option<String>,

    #[serde(default)]
    pub custom_title: String,

    #[serde(default)]
    pub custom_description: String,

    /// Message posted with the notification, role mention included.
    #[serde(default)]
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordChannel {
    pub discord_id: String,
    pub name: String,

    #[serde(default)]
    pub jump_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordRole {
    pub discord_id: String,
    pub name: String,

    /// Mention string, e.g. `<@&123>`.
    pub mention: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordUser {
    pub discord_id: String,
    pub name: String,

    #[serde(default)]
    pub avatar_url: String,

    #[serde(default)]
    pub mention: String,

    #[serde(default)]
    pub is_admin: bool,
}

/// A Discord server reachable by the linked bot, with its channels and roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordServer {
    pub discord_id: String,
    pub name: String,

    #[serde(default)]
    pub icon_url: String,

    #[serde(default)]
    pub description: String,

    pub owner: DiscordUser,

    #[serde(default)]
    pub channels: Vec<DiscordChannel>,

    #[serde(default)]
    pub roles: Vec<DiscordRole>,
}

impl DiscordServer {
    pub fn channel(&self, discord_id: &str) -> Option<&DiscordChannel> {
        self.channels.iter().find(|c| c.discord_id == discord_id)
    }

    pub fn role(&self, discord_id: &str) -> Option<&DiscordRole> {
        self.roles.iter().find(|r| r.discord_id == discord_id)
    }
}

/// Twitch user as returned by the backend's Helix lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub display_name: String,

    #[serde(default)]
    pub profile_image_url: String,
}

/// Helix-style envelope around a Twitch user lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TwitchUserList {
    pub data: Vec<TwitchUser>,
}

/// Twitch EventSub event types the backend can subscribe to.
pub const EVENT_TYPES: [&str; 45] = [
    "channel.update",
    "channel.follow",
    "channel.subscribe",
    "channel.subscription.end",
    "channel.subscription.gift",
    "channel.subscription.message",
    "channel.cheer",
    "channel.raid",
    "channel.ban",
    "channel.unban",
    "channel.moderator.add",
    "channel.moderator.remove",
    "channel.channel_points_custom_reward.add",
    "channel.channel_points_custom_reward.update",
    "channel.channel_points_custom_reward.remove",
    "channel.channel_points_custom_reward_redemption.add",
    "channel.channel_points_custom_reward_redemption.update",
    "channel.poll.begin",
    "channel.poll.progress",
    "channel.poll.end",
    "channel.prediction.begin",
    "channel.prediction.progress",
    "channel.prediction.lock",
    "channel.prediction.end",
    "channel.charity_campaign.donate",
    "channel.charity_campaign.start",
    "channel.charity_campaign.progress",
    "channel.charity_campaign.stop",
    "drop.entitlement.grant",
    "extension.bits_transaction.create",
    "channel.goal.begin",
    "channel.goal.progress",
    "channel.goal.end",
    "channel.hype_train.begin",
    "channel.hype_train.progress",
    "channel.hype_train.end",
    "channel.shield_mode.begin",
    "channel.shield_mode.end",
    "channel.shoutout.create",
    "channel.shoutout.receive",
    "stream.online",
    "stream.offline",
    "user.authorization.grant",
    "user.authorization.revoke",
    "user.update",
];

static EVENT_TYPE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| EVENT_TYPES.iter().copied().collect());

/// Whether `name` is a known Twitch event type.
pub fn is_event_type(name: &str) -> bool {
    EVENT_TYPE_SET.contains(name)
}
