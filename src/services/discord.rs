use crate::client::ApiClient;
use crate::error::Result;
use crate::models::DiscordServer;

/// Servers reachable by the linked bot/user. Only meaningful once the
/// current user has linked a Discord account.
pub async fn get_discord_servers(client: &ApiClient) -> Result<Vec<DiscordServer>> {
    client.get("/api/discord/servers").await
}

pub async fn get_discord_server(client: &ApiClient, discord_id: &str) -> Result<DiscordServer> {
    client
        .get(&format!("/api/discord/servers/{}", discord_id))
        .await
}
