use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    #[error("Transient auth error: {0}")]
    TransientAuth(String),

    #[error("Authorization aborted: {0}")]
    Authorization(String),

    #[error("Credential storage error: {0}")]
    TokenStorage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
