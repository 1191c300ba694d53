//! Session cookie persistence.
//!
//! Interactive runs keep the session cookie in a JSON state file so the login
//! survives between invocations; everything else uses a plain in-memory jar.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Persisted session state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionState {
    /// Schema version for migrations
    version: u32,

    /// Cookie pairs (`name=value`) scoped to the backend origin.
    cookies: Vec<String>,
}

/// Cookie jar for the shared client, optionally backed by a state file.
pub struct SessionStore {
    jar: Arc<Jar>,
    path: Option<String>,
}

impl SessionStore {
    /// In-memory jar with no persistence.
    pub fn in_memory() -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            path: None,
        }
    }

    /// Load the session from a JSON file, or start fresh if it does not exist.
    pub async fn load(path: &str, origin: &Url) -> Result<Self> {
        let state = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                serde_json::from_str::<SessionState>(&content).map_err(|e| {
                    ApiError::SessionParse {
                        path: path.to_string(),
                        source: e,
                    }
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionState::default(),
            Err(e) => {
                return Err(ApiError::SessionLoad {
                    path: path.to_string(),
                    source: e,
                })
            }
        };

        let jar = Jar::default();
        for pair in &state.cookies {
            jar.add_cookie_str(pair, origin);
        }
        debug!(
            "Loaded session from '{}' ({} cookies)",
            path,
            state.cookies.len()
        );

        Ok(Self {
            jar: Arc::new(jar),
            path: Some(path.to_string()),
        })
    }

    /// Save the current cookies for `origin` atomically, if persistence is on.
    pub async fn save(&self, origin: &Url) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let cookies = match self.jar.cookies(origin) {
            Some(header) => header
                .to_str()
                .unwrap_or_default()
                .split("; ")
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            None => Vec::new(),
        };

        let state = SessionState {
            version: 1,
            cookies,
        };
        let content = serde_json::to_string_pretty(&state)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = format!("{}.tmp", path);
        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| ApiError::SessionSave {
                path: path.to_string(),
                source: e,
            })?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| ApiError::SessionSave {
                path: path.to_string(),
                source: e,
            })?;

        Ok(())
    }

    /// The jar to install as the client's cookie provider.
    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}
