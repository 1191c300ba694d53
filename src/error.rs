use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // Transport-derived errors
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // Session persistence errors
    #[error("failed to load session from '{path}': {source}")]
    SessionLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save session to '{path}': {source}")]
    SessionSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session file '{path}': {source}")]
    SessionParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // Configuration errors
    #[error("invalid configuration: {message}")]
    Config { message: String },

    // Form errors
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("unknown event type: {event}")]
    UnknownEvent { event: String },

    // Generic errors
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Status code of the failed request, if this is a transport-derived error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend rejected the request outright (HTTP 400).
    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }

    /// The session is missing or expired (HTTP 401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Owned copy for storage or sharing. Status errors survive intact;
    /// anything else degrades to its message.
    pub fn cloned(&self) -> ApiError {
        match self {
            ApiError::Status { status, message } => ApiError::Status {
                status: *status,
                message: message.clone(),
            },
            other => ApiError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = ApiError::Status {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(err.is_bad_request());
        assert!(!err.is_unauthorized());

        let err = ApiError::Status {
            status: 401,
            message: "nope".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));

        let err = ApiError::MissingField {
            field: "event".to_string(),
        };
        assert_eq!(err.status(), None);
    }
}
