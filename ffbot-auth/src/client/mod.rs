mod authorizer;
mod config;
mod credential_store;
mod oauth_client;
mod token_manager;

pub use authorizer::{Authorizer, ConsoleAuthorizer};
pub use config::OAuthSettings;
pub use credential_store::CredentialStore;
pub use oauth_client::{GrantError, OAuthClient};
pub use token_manager::TokenManager;

use crate::error::AuthError;
use std::sync::Arc;

/// Authenticate before starting the scheduler.
/// Returns a manager holding a valid token or fails with the reason.
pub async fn authenticate(settings: &OAuthSettings) -> Result<TokenManager, AuthError> {
    settings.validate()?;

    let store = CredentialStore::new(&settings.credentials_path, &settings.provider);
    tracing::info!(
        provider = %settings.provider,
        path = %settings.credentials_path.display(),
        "Loading credentials"
    );

    TokenManager::initialize(store, settings, Arc::new(ConsoleAuthorizer)).await
}
