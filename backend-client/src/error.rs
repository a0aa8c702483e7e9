use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No access token was stored; the request was never sent.
    #[error("unauthorized: no access token found, log in first")]
    Unauthenticated,

    /// The backend rejected the access token and refreshing it did not help.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("resource not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("forbidden: you do not have permission to access this resource")]
    Forbidden,

    #[error("server error occurred")]
    ServerError,

    /// Any other non-success status. `message` carries the backend's `detail`
    /// when it sent one.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("credential store error: {0}")]
    Store(#[from] std::io::Error),
}

impl ApiError {
    /// True for failures that should send the user back to the login flow.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthenticated | ApiError::AuthenticationFailed | ApiError::LoginFailed(_)
        )
    }

    /// HTTP status behind this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Forbidden => Some(403),
            ApiError::ServerError => Some(500),
            ApiError::RequestFailed { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn invalid_header(name: &str, reason: impl ToString) -> Self {
        ApiError::InvalidHeader {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
