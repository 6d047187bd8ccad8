use ffbot_auth::AuthError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FantasyApiError {
    /// Non-2xx response, after the one retry allowed for a rejected token
    #[error("({status}) {body}")]
    Status { status: StatusCode, body: String },

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API credential is read-only
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Malformed response document: {0}")]
    Document(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FantasyApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
