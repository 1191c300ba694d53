// tests/api.rs
//
// End-to-end tests against an in-process mock of the backend REST API.
// The mock counts requests per endpoint so the tests can assert which
// queries actually reached the wire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use ttv_tools::cache::{QueryCache, QueryKey};
use ttv_tools::client::ApiClient;
use ttv_tools::forms::EventSubForm;
use ttv_tools::models::{DiscordServer, EventSubscription, User};
use ttv_tools::views::{
    EventSubDetailView, EventSubsPage, EventSubsView, HomePage, HomeView, InvitesPage, InvitesView,
    RedeemInviteView, RedeemPage,
};

#[derive(Default)]
struct BackendState {
    current_user: Option<Value>,
    users: Vec<Value>,
    eventsubs: Vec<Value>,
    eventsubs_unavailable: bool,
    invites: HashMap<String, Value>,
    teams: HashMap<String, Value>,
    servers: Vec<Value>,
    twitch_users: Vec<Value>,
    hits: HashMap<&'static str, usize>,
}

#[derive(Clone, Default)]
struct Backend(Arc<Mutex<BackendState>>);

impl Backend {
    fn hits(&self, endpoint: &str) -> usize {
        self.0.lock().unwrap().hits.get(endpoint).copied().unwrap_or(0)
    }

    fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}

fn hit(state: &mut BackendState, endpoint: &'static str) {
    *state.hits.entry(endpoint).or_default() += 1;
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not logged in"})),
    )
}

async fn current_user(State(b): State<Backend>) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "current_user");
        match &s.current_user {
            Some(user) => (StatusCode::OK, Json(user.clone())),
            None => unauthorized(),
        }
    })
}

async fn all_users(State(b): State<Backend>) -> Json<Value> {
    b.with(|s| {
        hit(s, "users_all");
        Json(Value::Array(s.users.clone()))
    })
}

async fn list_eventsubs(State(b): State<Backend>) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "eventsubs");
        if s.eventsubs_unavailable {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": "Event subscriptions are disabled"})),
            )
        } else {
            (StatusCode::OK, Json(Value::Array(s.eventsubs.clone())))
        }
    })
}

async fn list_eventsubs_by_user(
    State(b): State<Backend>,
    Path(user_uuid): Path<String>,
) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "eventsubs_by_user");
        if s.eventsubs_unavailable {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": "Event subscriptions are disabled"})),
            );
        }
        let subs: Vec<Value> = s
            .eventsubs
            .iter()
            .filter(|e| e["user_uuid"] == json!(user_uuid))
            .cloned()
            .collect();
        (StatusCode::OK, Json(Value::Array(subs)))
    })
}

async fn create_eventsub(State(b): State<Backend>, Json(mut body): Json<Value>) -> Json<Value> {
    b.with(|s| {
        hit(s, "eventsub_create");
        body["uuid"] = json!(Uuid::new_v4().to_string());
        body["created_on"] = json!(chrono::Utc::now().to_rfc3339());
        s.eventsubs.push(body.clone());
        Json(body)
    })
}

async fn get_eventsub(
    State(b): State<Backend>,
    Path(uuid): Path<String>,
) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "eventsub_get");
        match s.eventsubs.iter().find(|e| e["uuid"] == json!(uuid)) {
            Some(sub) => (StatusCode::OK, Json(sub.clone())),
            None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No such subscription"}))),
        }
    })
}

async fn delete_eventsub(
    State(b): State<Backend>,
    Path(uuid): Path<String>,
) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "eventsub_delete");
        match s.eventsubs.iter().position(|e| e["uuid"] == json!(uuid)) {
            Some(i) => (StatusCode::OK, Json(s.eventsubs.remove(i))),
            None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No such subscription"}))),
        }
    })
}

async fn list_servers(State(b): State<Backend>) -> Json<Value> {
    b.with(|s| {
        hit(s, "servers");
        Json(Value::Array(s.servers.clone()))
    })
}

async fn get_invite(State(b): State<Backend>, Path(uuid): Path<String>) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "invite_get");
        match s.invites.get(&uuid) {
            Some(invite) => (StatusCode::OK, Json(invite.clone())),
            None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No such invite"}))),
        }
    })
}

async fn redeem_invite(
    State(b): State<Backend>,
    Path(uuid): Path<String>,
) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "redeem");
        match s.invites.get(&uuid) {
            Some(invite) => (StatusCode::OK, Json(invite.clone())),
            None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No such invite"}))),
        }
    })
}

async fn list_teams(State(b): State<Backend>) -> Json<Value> {
    b.with(|s| {
        hit(s, "teams");
        Json(Value::Array(s.teams.values().cloned().collect()))
    })
}

async fn get_team(State(b): State<Backend>, Path(uuid): Path<String>) -> (StatusCode, Json<Value>) {
    b.with(|s| {
        hit(s, "team_get");
        match s.teams.get(&uuid) {
            Some(team) => (StatusCode::OK, Json(team.clone())),
            None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No such team"}))),
        }
    })
}

async fn twitch_users(State(b): State<Backend>) -> Json<Value> {
    b.with(|s| {
        hit(s, "twitch_users");
        Json(json!({"data": s.twitch_users}))
    })
}

fn router(backend: Backend) -> Router {
    Router::new()
        .route("/api/users/", get(current_user))
        .route("/api/users/all", get(all_users))
        .route("/api/eventsubs/", get(list_eventsubs).post(create_eventsub))
        .route("/api/eventsubs/user/:uuid", get(list_eventsubs_by_user))
        .route(
            "/api/eventsubs/:uuid",
            get(get_eventsub).delete(delete_eventsub),
        )
        .route("/api/discord/servers", get(list_servers))
        .route("/api/invites/:uuid", get(get_invite))
        .route("/api/invites/:uuid/redeem", axum::routing::post(redeem_invite))
        .route("/api/teams/", get(list_teams))
        .route("/api/teams/:uuid", get(get_team))
        .route("/api/twitch/users", get(twitch_users))
        .with_state(backend)
}

/// Serve the mock on an ephemeral port, returning its base URL.
async fn spawn_backend(backend: Backend) -> Result<String, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(backend);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Mock backend error: {:?}", e);
        }
    });
    Ok(format!("http://{}", addr))
}

async fn connect(backend: &Backend) -> Result<(Arc<ApiClient>, QueryCache), Box<dyn std::error::Error>> {
    let base_url = spawn_backend(backend.clone()).await?;
    let client = Arc::new(ApiClient::for_base_url(base_url).await?);
    Ok((client, QueryCache::new()))
}

const USER_UUID: &str = "7f1b79a4-3e53-46f0-b62c-0e46a45f4b0f";
const TEAM_UUID: &str = "c6c7b632-6fbd-4e44-9376-b0c8fba6c09e";

fn user_json(twitch_id: &str, superadmin: bool, discord_id: Option<&str>) -> Value {
    let mut user = json!({
        "uuid": USER_UUID,
        "twitch_id": twitch_id,
        "name": "Streamer",
        "login_name": "streamer",
        "is_superadmin": superadmin,
    });
    if let Some(id) = discord_id {
        user["discord_id"] = json!(id);
    }
    user
}

fn eventsub_json(uuid: &str) -> Value {
    json!({
        "uuid": uuid,
        "user_uuid": USER_UUID,
        "server_discord_id": "S1",
        "channel_discord_id": "C1",
        "event": "stream.online",
    })
}

fn server_json() -> Value {
    json!({
        "discord_id": "S1",
        "name": "guild",
        "owner": {"discord_id": "O1", "name": "owner"},
        "channels": [{"discord_id": "C1", "name": "general"}],
        "roles": [{"discord_id": "R1", "name": "subs", "mention": "<@&123>"}],
    })
}

#[tokio::test]
async fn test_unauthorized_current_user_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::default();
    let (client, cache) = connect(&backend).await?;

    let page = HomeView::new(client, cache).load().await?;
    assert!(matches!(page, HomePage::LoggedOut { .. }));

    // Identity query: the 401 must surface after exactly one attempt.
    assert_eq!(backend.hits("current_user"), 1);
    Ok(())
}

#[tokio::test]
async fn test_no_requests_before_login() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::default();
    let (client, cache) = connect(&backend).await?;

    let page = InvitesView::new(client, cache).load().await?;
    assert!(matches!(page, InvitesPage::NotLoggedIn));

    // The dependent queries never fire without a session.
    assert_eq!(backend.hits("teams"), 0);
    assert_eq!(backend.hits("invite_get"), 0);
    assert_eq!(backend.hits("twitch_users"), 0);
    Ok(())
}

#[tokio::test]
async fn test_discord_servers_gated_on_linked_account() -> Result<(), Box<dyn std::error::Error>> {
    // Unlinked: the servers query must not reach the wire.
    let backend = Backend::default();
    backend.with(|s| s.current_user = Some(user_json("42", false, None)));
    let (client, cache) = connect(&backend).await?;
    let page = EventSubsView::new(client, cache).load().await?;
    assert!(matches!(page, EventSubsPage::Ready { .. }));
    assert_eq!(backend.hits("servers"), 0);

    // Linked: exactly one request.
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, Some("D1")));
        s.servers = vec![server_json()];
    });
    let (client, cache) = connect(&backend).await?;
    let page = EventSubsView::new(client, cache).load().await?;
    match page {
        EventSubsPage::Ready { discord_servers, .. } => assert_eq!(discord_servers.len(), 1),
        _ => panic!("expected a ready page"),
    }
    assert_eq!(backend.hits("servers"), 1);
    Ok(())
}

#[tokio::test]
async fn test_users_listing_only_for_superadmins() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::default();
    backend.with(|s| s.current_user = Some(user_json("42", false, None)));
    let (client, cache) = connect(&backend).await?;
    EventSubsView::new(client, cache).load().await?;
    assert_eq!(backend.hits("users_all"), 0);
    assert_eq!(backend.hits("eventsubs_by_user"), 1);
    assert_eq!(backend.hits("eventsubs"), 0);

    let backend = Backend::default();
    backend.with(|s| s.current_user = Some(user_json("42", true, None)));
    let (client, cache) = connect(&backend).await?;
    EventSubsView::new(client, cache).load().await?;
    assert_eq!(backend.hits("users_all"), 1);
    assert_eq!(backend.hits("eventsubs"), 1);
    assert_eq!(backend.hits("eventsubs_by_user"), 0);
    Ok(())
}

#[tokio::test]
async fn test_bad_request_renders_feature_unavailable() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, None));
        s.eventsubs_unavailable = true;
    });
    let (client, cache) = connect(&backend).await?;

    let page = EventSubsView::new(client, cache).load().await?;
    assert!(matches!(page, EventSubsPage::FeatureUnavailable));
    Ok(())
}

#[tokio::test]
async fn test_delete_invalidates_eventsubs_listing() -> Result<(), Box<dyn std::error::Error>> {
    let sub_uuid = Uuid::new_v4();
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, None));
        s.eventsubs = vec![eventsub_json(&sub_uuid.to_string())];
    });
    let (client, cache) = connect(&backend).await?;
    let view = EventSubsView::new(client, cache);

    // Two loads, one request: the second is served from cache.
    view.load().await?;
    view.load().await?;
    assert_eq!(backend.hits("eventsubs_by_user"), 1);

    view.delete(sub_uuid).await?;
    assert_eq!(backend.hits("eventsub_delete"), 1);

    // The listing is stale now; reading it kicks off a refetch.
    view.load().await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.hits("eventsubs_by_user"), 2);

    match view.load().await? {
        EventSubsPage::Ready { eventsubs, .. } => assert!(eventsubs.is_empty()),
        _ => panic!("expected a ready page"),
    }
    Ok(())
}

#[tokio::test]
async fn test_create_seeds_the_subscription_entity() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, Some("D1")));
        s.servers = vec![server_json()];
    });
    let (client, cache) = connect(&backend).await?;

    let server: DiscordServer = serde_json::from_value(server_json())?;
    let current_user: User = serde_json::from_value(user_json("42", false, Some("D1")))?;

    let mut form = EventSubForm::new();
    form.set_event("stream.online");
    form.set_server(server);
    assert!(form.select_channel("C1"));
    assert!(form.select_role("R1"));
    form.message = "live now".to_string();

    let created = form.submit(&client, &cache, &current_user).await?;
    let created_uuid = created.uuid.ok_or("create response carried no uuid")?;
    assert_eq!(created.message, "<@&123> live now");
    // uuid and created_on are server-assigned on create.
    assert!(created.created_on.is_some());

    // The response body seeded the entity's own key; no read has hit the
    // wire yet.
    let seeded: EventSubscription = cache
        .data(&QueryKey::of("eventsubs").with(created_uuid))
        .ok_or("entity key was not seeded")?;
    assert_eq!(seeded, created);
    assert_eq!(backend.hits("eventsub_get"), 0);

    // The detail page renders from the seeded value.
    let detail = EventSubDetailView::new(client, cache, created_uuid)
        .load()
        .await?;
    assert_eq!(detail.eventsub.uuid, Some(created_uuid));
    assert_eq!(detail.channel.map(|c| c.name), Some("general".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_invite_for_someone_else_is_not_redeemable() -> Result<(), Box<dyn std::error::Error>> {
    let invite_uuid = Uuid::new_v4();
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, None));
        s.invites.insert(
            invite_uuid.to_string(),
            json!({
                "uuid": invite_uuid.to_string(),
                "team_uuid": TEAM_UUID,
                "user_twitch_id": "999",
            }),
        );
    });
    let (client, cache) = connect(&backend).await?;

    let view = RedeemInviteView::new(client, cache, invite_uuid);
    let page = view.load().await?;
    assert!(matches!(page, RedeemPage::NotForYou { .. }));
    assert_eq!(backend.hits("redeem"), 0);
    Ok(())
}

#[tokio::test]
async fn test_redeem_confirms_inline_and_suppresses_repeats(
) -> Result<(), Box<dyn std::error::Error>> {
    let invite_uuid = Uuid::new_v4();
    let backend = Backend::default();
    backend.with(|s| {
        s.current_user = Some(user_json("42", false, None));
        s.invites.insert(
            invite_uuid.to_string(),
            json!({
                "uuid": invite_uuid.to_string(),
                "team_uuid": TEAM_UUID,
                "user_twitch_id": "42",
            }),
        );
        s.teams.insert(
            TEAM_UUID.to_string(),
            json!({"uuid": TEAM_UUID, "name": "Raiders", "description": "We raid."}),
        );
        s.twitch_users = vec![json!({
            "id": "42",
            "login": "streamer",
            "display_name": "Streamer",
        })];
    });
    let (client, cache) = connect(&backend).await?;

    let mut view = RedeemInviteView::new(client, cache, invite_uuid);
    match view.load().await? {
        RedeemPage::Ready { joined, team, .. } => {
            assert!(!joined);
            assert_eq!(team.map(|t| t.name), Some("Raiders".to_string()));
        }
        _ => panic!("expected a redeemable page"),
    }

    view.redeem().await?;
    assert_eq!(backend.hits("redeem"), 1);

    // The confirmation is inline and a second redeem is refused locally.
    match view.load().await? {
        RedeemPage::Ready { joined, .. } => assert!(joined),
        _ => panic!("expected a redeemable page"),
    }
    assert!(view.redeem().await.is_err());
    assert_eq!(backend.hits("redeem"), 1);
    Ok(())
}
