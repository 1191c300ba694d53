//! Shared HTTP client for the backend API.
//!
//! Every resource accessor goes through one [`ApiClient`], which carries the
//! session cookie across requests. No retries or timeouts live here; the
//! cache layer owns that policy.

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{ApiError, Result};
use crate::session::SessionStore;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    origin: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Build the shared client from settings, loading a persisted session
    /// when one is configured.
    pub async fn new(settings: &Settings) -> Result<Self> {
        let origin: Url = settings.base_url.parse().map_err(|e| ApiError::Config {
            message: format!("invalid base URL '{}': {}", settings.base_url, e),
        })?;

        let session = match &settings.session_path {
            Some(path) => SessionStore::load(path, &origin).await?,
            None => SessionStore::in_memory(),
        };
        let session = Arc::new(session);

        let http = reqwest::Client::builder()
            .cookie_provider(session.jar())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            origin,
            session,
        })
    }

    /// Client against `base_url` with an in-memory session.
    pub async fn for_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&Settings::new(base_url)).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// GET with query parameters. Array-valued parameters are passed as
    /// repeated pairs, so they serialize in repeated-key form (`?id=1&id=2`).
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.execute(self.http.get(self.url(path)).query(params))
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// POST without a body (action endpoints such as invite redemption).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.post(self.url(path))).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.delete(self.url(path))).await
    }

    /// Resolve with the parsed body on 2xx, reject with the status and the
    /// backend's `detail` message otherwise.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        // Keep the persisted session in step with any Set-Cookie we received.
        if let Err(e) = self.session.save(&self.origin).await {
            warn!("Could not persist session: {}", e);
        }

        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("detail")
                        .or_else(|| v.get("message"))
                        .and_then(|d| d.as_str().map(|s| s.to_string()))
                })
                .unwrap_or(body);
            debug!("Request failed with {}: {}", status, message);
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    // Session/OAuth redirects are browser navigations, not JSON calls; the
    // client only knows how to point at them.

    pub fn twitch_login_url(&self, redirect: Option<&str>) -> String {
        match redirect {
            Some(target) => format!("{}/api/twitch/login?redirect={}", self.base_url, target),
            None => format!("{}/api/twitch/login", self.base_url),
        }
    }

    pub fn discord_login_url(&self) -> String {
        format!("{}/api/discord/login", self.base_url)
    }

    pub fn discord_unlink_url(&self) -> String {
        format!("{}/api/discord/unlink", self.base_url)
    }

    pub fn discord_addbot_url(&self) -> String {
        format!("{}/api/discord/addbot", self.base_url)
    }

    pub fn logout_url(&self) -> String {
        format!("{}/api/logout", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_building() {
        let client = ApiClient::for_base_url("http://localhost:8000").await.unwrap();
        assert_eq!(client.url("/api/users/"), "http://localhost:8000/api/users/");
        assert_eq!(
            client.twitch_login_url(Some("invites/redeem/abc")),
            "http://localhost:8000/api/twitch/login?redirect=invites/redeem/abc"
        );
        assert_eq!(
            client.logout_url(),
            "http://localhost:8000/api/logout"
        );
    }

    #[test]
    fn test_repeated_key_query_form() {
        // The backend expects ?id=1&id=2, never comma-joined or bracketed.
        let request = reqwest::Client::new()
            .get("http://localhost:8000/api/twitch/users")
            .query(&[("id", "1"), ("id", "2")])
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("id=1&id=2"));
    }

    #[tokio::test]
    async fn test_invalid_base_url_rejected() {
        let result = ApiClient::for_base_url("not a url").await;
        assert!(matches!(result, Err(ApiError::Config { .. })));
    }
}
