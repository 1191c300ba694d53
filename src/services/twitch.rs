use crate::client::ApiClient;
use crate::error::Result;
use crate::models::TwitchUserList;

/// Look up Twitch users by login name.
pub async fn get_twitch_users(client: &ApiClient, logins: &[&str]) -> Result<TwitchUserList> {
    client
        .get_with_query("/api/twitch/users", &repeated("login", logins))
        .await
}

/// Look up Twitch users by id.
pub async fn get_twitch_users_by_id(client: &ApiClient, ids: &[&str]) -> Result<TwitchUserList> {
    client
        .get_with_query("/api/twitch/users", &repeated("id", ids))
        .await
}

/// Pair every value with the same key, yielding `?key=a&key=b`.
fn repeated<'a>(key: &'a str, values: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    values.iter().map(|v| (key, *v)).collect()
}
