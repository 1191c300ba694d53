use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::EventSubscription;

/// All event subscriptions; privileged.
pub async fn get_event_subs(client: &ApiClient) -> Result<Vec<EventSubscription>> {
    client.get("/api/eventsubs/").await
}

pub async fn get_event_subs_by_user(
    client: &ApiClient,
    user_uuid: Uuid,
) -> Result<Vec<EventSubscription>> {
    client
        .get(&format!("/api/eventsubs/user/{}", user_uuid))
        .await
}

pub async fn create_event_sub(
    client: &ApiClient,
    eventsub: &EventSubscription,
) -> Result<EventSubscription> {
    client.post("/api/eventsubs/", eventsub).await
}

pub async fn get_event_sub(client: &ApiClient, uuid: Uuid) -> Result<EventSubscription> {
    client.get(&format!("/api/eventsubs/{}", uuid)).await
}

pub async fn update_event_sub(
    client: &ApiClient,
    uuid: Uuid,
    eventsub: &EventSubscription,
) -> Result<EventSubscription> {
    client.put(&format!("/api/eventsubs/{}", uuid), eventsub).await
}

pub async fn delete_event_sub(client: &ApiClient, uuid: Uuid) -> Result<EventSubscription> {
    client.delete(&format!("/api/eventsubs/{}", uuid)).await
}
