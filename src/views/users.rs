//! User detail page: the profile, its Discord link state, and the account
//! actions (link/unlink/logout/delete).

use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::User;
use crate::services::users;
use crate::views::{current_user_key, fetch_current_user};

/// Discord link state of the displayed user, with the URL for the action
/// that flips it.
pub enum DiscordLink {
    Linked { unlink_url: String },
    Unlinked { link_url: String },
}

pub struct UserPage {
    pub user: User,
    pub current_user: Option<User>,
    pub discord: DiscordLink,
    pub logout_url: String,
    /// URL to invite the notification bot into a server; only meaningful
    /// with a linked Discord account.
    pub addbot_url: String,
}

impl UserPage {
    /// Whether the page shows the viewer's own profile.
    pub fn is_own_profile(&self) -> bool {
        self.current_user
            .as_ref()
            .and_then(|u| u.uuid)
            .zip(self.user.uuid)
            .is_some_and(|(a, b)| a == b)
    }
}

pub struct UserView {
    client: Arc<ApiClient>,
    cache: QueryCache,
    uuid: Uuid,
}

impl UserView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache, uuid: Uuid) -> Self {
        Self {
            client,
            cache,
            uuid,
        }
    }

    pub async fn load(&self) -> Result<UserPage> {
        let user_query = {
            let client = self.client.clone();
            let uuid = self.uuid;
            self.cache.fetch(
                QueryKey::of("users").with(uuid),
                QueryOptions::no_retry(),
                move || {
                    let client = client.clone();
                    async move { users::get_user(&client, uuid).await }
                },
            )
        };
        let (user, current_user) =
            futures::join!(user_query, fetch_current_user(&self.client, &self.cache));

        let user: User = user?.ok_or_else(|| ApiError::Internal {
            message: "user query unexpectedly disabled".to_string(),
        })?;

        let discord = if user.discord_linked() {
            DiscordLink::Linked {
                unlink_url: self.client.discord_unlink_url(),
            }
        } else {
            DiscordLink::Unlinked {
                link_url: self.client.discord_login_url(),
            }
        };

        Ok(UserPage {
            user,
            current_user: current_user.ok(),
            discord,
            logout_url: self.client.logout_url(),
            addbot_url: self.client.discord_addbot_url(),
        })
    }

    /// Delete the account and drop everything keyed off it, the current-user
    /// query included.
    pub async fn delete(&self) -> Result<User> {
        self.cache
            .mutate(
                users::delete_user(&self.client, self.uuid),
                |_| None,
                &[QueryKey::of("users"), current_user_key()],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uuid: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "uuid": uuid,
            "twitch_id": "42",
            "name": "Streamer",
            "login_name": "streamer",
            "icon_url": "",
            "description": ""
        }))
        .unwrap()
    }

    #[test]
    fn test_own_profile_matches_uuid() {
        let uuid = "c6c7b632-6fbd-4e44-9376-b0c8fba6c09e";
        let page = UserPage {
            user: user(uuid),
            current_user: Some(user(uuid)),
            discord: DiscordLink::Unlinked {
                link_url: String::new(),
            },
            logout_url: String::new(),
            addbot_url: String::new(),
        };
        assert!(page.is_own_profile());
    }

    #[test]
    fn test_foreign_profile() {
        let page = UserPage {
            user: user("c6c7b632-6fbd-4e44-9376-b0c8fba6c09e"),
            current_user: Some(user("7f1b79a4-3e53-46f0-b62c-0e46a45f4b0f")),
            discord: DiscordLink::Unlinked {
                link_url: String::new(),
            },
            logout_url: String::new(),
            addbot_url: String::new(),
        };
        assert!(!page.is_own_profile());
    }

    #[test]
    fn test_logged_out_viewer() {
        let page = UserPage {
            user: user("c6c7b632-6fbd-4e44-9376-b0c8fba6c09e"),
            current_user: None,
            discord: DiscordLink::Unlinked {
                link_url: String::new(),
            },
            logout_url: String::new(),
            addbot_url: String::new(),
        };
        assert!(!page.is_own_profile());
    }
}
