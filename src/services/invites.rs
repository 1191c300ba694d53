use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::TeamInvite;

pub async fn get_invites(client: &ApiClient) -> Result<Vec<TeamInvite>> {
    client.get("/api/invites/").await
}

pub async fn create_invite(client: &ApiClient, invite: &TeamInvite) -> Result<TeamInvite> {
    client.post("/api/invites/", invite).await
}

pub async fn get_invite(client: &ApiClient, uuid: Uuid) -> Result<TeamInvite> {
    client.get(&format!("/api/invites/{}", uuid)).await
}

pub async fn update_invite(
    client: &ApiClient,
    uuid: Uuid,
    invite: &TeamInvite,
) -> Result<TeamInvite> {
    client.put(&format!("/api/invites/{}", uuid), invite).await
}

pub async fn delete_invite(client: &ApiClient, uuid: Uuid) -> Result<TeamInvite> {
    client.delete(&format!("/api/invites/{}", uuid)).await
}

/// Redeem an invite for the current user. One-time side effect; the backend
/// checks the caller's Twitch identity.
pub async fn redeem_invite(client: &ApiClient, uuid: Uuid) -> Result<TeamInvite> {
    client
        .post_empty(&format!("/api/invites/{}/redeem", uuid))
        .await
}
