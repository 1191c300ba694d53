//! Per-page view models.
//!
//! A view composes the queries a page needs (with their enablement
//! predicates, retry rules and derived lookups) and returns a snapshot the
//! caller can render. Sibling queries run concurrently; a dependent query
//! only fires once its prerequisite's data is present.

mod eventsubs;
mod home;
mod invites;
mod teams;
mod users;

pub use eventsubs::{resolve_target, EventSubDetail, EventSubDetailView, EventSubsPage, EventSubsView};
pub use home::{HomePage, HomeView};
pub use invites::{InvitesPage, InvitesView, RedeemInviteView, RedeemPage};
pub use teams::{TeamDetail, TeamDetailView, TeamsPage, TeamsView};
pub use users::{DiscordLink, UserPage, UserView};

use std::sync::Arc;

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::User;
use crate::services::users::get_current_user;

/// Cache key of the current-user query, shared by every page.
pub(crate) fn current_user_key() -> QueryKey {
    QueryKey::of("currentUser")
}

/// Fetch the current user through the cache. Identity-sensitive: never
/// retried, so a 401 surfaces immediately as "not logged in".
pub(crate) async fn fetch_current_user(
    client: &Arc<ApiClient>,
    cache: &QueryCache,
) -> Result<User> {
    let client = client.clone();
    let user = cache
        .fetch(current_user_key(), QueryOptions::no_retry(), move || {
            let client = client.clone();
            async move { get_current_user(&client).await }
        })
        .await?;
    user.ok_or_else(|| ApiError::Internal {
        message: "current-user query unexpectedly disabled".to_string(),
    })
}
