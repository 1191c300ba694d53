//! Client configuration loaded from the environment.

/// Settings for the shared API client.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the backend, e.g. `https://ttv.example.com`.
    pub base_url: String,

    /// Path of the JSON file holding the session cookie between runs.
    /// When unset the session lives in memory only.
    pub session_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let base_url = std::env::var("TTV_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let session_path = std::env::var("TTV_SESSION_PATH").ok();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_path,
        }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_path: None,
        }
    }
}
