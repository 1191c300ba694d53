//! Landing page: current user or a login pointer.

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::User;
use crate::views::fetch_current_user;

pub enum HomePage {
    /// Not logged in (or the lookup failed): point at the Twitch login.
    LoggedOut { login_url: String },
    LoggedIn { user: User },
}

pub struct HomeView {
    client: Arc<ApiClient>,
    cache: QueryCache,
}

impl HomeView {
    pub fn new(client: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub async fn load(&self) -> Result<HomePage> {
        match fetch_current_user(&self.client, &self.cache).await {
            Ok(user) => Ok(HomePage::LoggedIn { user }),
            // Any current-user failure renders as "login to continue".
            Err(_) => Ok(HomePage::LoggedOut {
                login_url: self.client.twitch_login_url(None),
            }),
        }
    }
}
