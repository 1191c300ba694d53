use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{Membership, Team, TeamInvite, TeamListEntry};

/// Teams visible to the caller: bare teams for superadmins, the caller's
/// memberships otherwise.
pub async fn get_teams(client: &ApiClient) -> Result<Vec<TeamListEntry>> {
    client.get("/api/teams/").await
}

pub async fn create_team(client: &ApiClient, team: &Team) -> Result<Team> {
    client.post("/api/teams/", team).await
}

pub async fn get_team(client: &ApiClient, team_uuid: Uuid) -> Result<Team> {
    client.get(&format!("/api/teams/{}", team_uuid)).await
}

pub async fn update_team(client: &ApiClient, team_uuid: Uuid, team: &Team) -> Result<Team> {
    client.put(&format!("/api/teams/{}", team_uuid), team).await
}

pub async fn delete_team(client: &ApiClient, team_uuid: Uuid) -> Result<Team> {
    client.delete(&format!("/api/teams/{}", team_uuid)).await
}

pub async fn get_invites_by_team(
    client: &ApiClient,
    team_uuid: Uuid,
) -> Result<Vec<TeamInvite>> {
    client
        .get(&format!("/api/teams/{}/invites", team_uuid))
        .await
}

pub async fn get_members(client: &ApiClient, team_uuid: Uuid) -> Result<Vec<Membership>> {
    client
        .get(&format!("/api/teams/{}/members", team_uuid))
        .await
}

pub async fn get_member(
    client: &ApiClient,
    team_uuid: Uuid,
    user_uuid: Uuid,
) -> Result<Membership> {
    client
        .get(&format!("/api/teams/{}/members/{}", team_uuid, user_uuid))
        .await
}

pub async fn update_member(
    client: &ApiClient,
    team_uuid: Uuid,
    user_uuid: Uuid,
    member: &Membership,
) -> Result<Membership> {
    client
        .put(
            &format!("/api/teams/{}/members/{}", team_uuid, user_uuid),
            member,
        )
        .await
}

pub async fn delete_member(
    client: &ApiClient,
    team_uuid: Uuid,
    user_uuid: Uuid,
) -> Result<Membership> {
    client
        .delete(&format!("/api/teams/{}/members/{}", team_uuid, user_uuid))
        .await
}
