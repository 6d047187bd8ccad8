// Shared data model
pub mod common;

// Credential storage and token lifecycle
mod client;
mod error;

pub use client::{
    authenticate, Authorizer, ConsoleAuthorizer, CredentialStore, GrantError, OAuthClient,
    OAuthSettings, TokenManager,
};
pub use common::{Credential, TokenSet};
pub use error::AuthError;
