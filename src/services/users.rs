use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::User;

/// Current authenticated user. Fails with 401 when not logged in.
pub async fn get_current_user(client: &ApiClient) -> Result<User> {
    client.get("/api/users/").await
}

/// All users; privileged.
pub async fn get_users(client: &ApiClient) -> Result<Vec<User>> {
    client.get("/api/users/all").await
}

pub async fn get_user(client: &ApiClient, user_uuid: Uuid) -> Result<User> {
    client.get(&format!("/api/users/{}", user_uuid)).await
}

pub async fn update_user(client: &ApiClient, user_uuid: Uuid, user: &User) -> Result<User> {
    client.put(&format!("/api/users/{}", user_uuid), user).await
}

pub async fn delete_user(client: &ApiClient, user_uuid: Uuid) -> Result<User> {
    client.delete(&format!("/api/users/{}", user_uuid)).await
}
