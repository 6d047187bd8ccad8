use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::authorizer::Authorizer;
use crate::client::config::OAuthSettings;
use crate::client::credential_store::CredentialStore;
use crate::client::oauth_client::{GrantError, OAuthClient};
use crate::common::{Credential, TokenSet};
use crate::error::AuthError;

/// Operator prompts per escalation before giving up
const MAX_INTERACTIVE_ATTEMPTS: usize = 2;

/// Owns the OAuth2 token state machine for one provider credential.
///
/// All token mutations (refresh, code exchange, interactive re-authorization)
/// happen while holding `state`, so concurrent callers that find a stale
/// token wait for the one in-flight refresh and reuse its result. Every new
/// token is written to the [`CredentialStore`] before it becomes visible in
/// memory.
pub struct TokenManager {
    oauth: OAuthClient,
    store: CredentialStore,
    authorizer: Arc<dyn Authorizer>,
    state: Mutex<Credential>,
    safety_margin: TimeDelta,
}

impl TokenManager {
    /// Load and validate the stored credential without contacting the provider
    pub fn new(
        store: CredentialStore,
        settings: &OAuthSettings,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, AuthError> {
        let credential = store.load()?;
        if credential.client_id.trim().is_empty() || credential.client_secret.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "client_id and client_secret are required for '{}'",
                store.provider()
            )));
        }

        let oauth = OAuthClient::new(&credential.client_id, &credential.client_secret, settings)?;

        Ok(Self {
            oauth,
            store,
            authorizer,
            state: Mutex::new(credential),
            safety_margin: settings.safety_margin(),
        })
    }

    /// Load the credential and obtain a usable token: refresh the stored
    /// token, else exchange the stored code, else ask the operator.
    pub async fn initialize(
        store: CredentialStore,
        settings: &OAuthSettings,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, AuthError> {
        let manager = Self::new(store, settings, authorizer)?;
        manager.acquire_initial().await?;
        Ok(manager)
    }

    async fn acquire_initial(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;

        if let Some(refresh_token) = state.refresh_token().map(str::to_string) {
            match self.oauth.refresh_access_token(&refresh_token).await {
                Ok(tokens) => {
                    self.persist_token(&mut state, tokens)?;
                    return Ok(());
                }
                Err(GrantError::InvalidGrant(msg)) => {
                    tracing::warn!("Stored refresh token was rejected: {}", msg);
                    self.reauthorize_locked(&mut state).await?;
                    return Ok(());
                }
                Err(GrantError::InvalidClient(msg)) => {
                    return Err(AuthError::Configuration(msg));
                }
                Err(GrantError::Transient(msg)) => {
                    tracing::warn!(
                        "Refresh at startup failed, falling back to authorization code: {}",
                        msg
                    );
                }
            }
        }

        let Some(code) = state.authorization_code.clone().filter(|c| !c.is_empty()) else {
            tracing::info!("No authorization code stored");
            self.reauthorize_locked(&mut state).await?;
            return Ok(());
        };

        match self.oauth.exchange_code(&code).await {
            Ok(tokens) => {
                self.persist_token(&mut state, tokens)?;
                Ok(())
            }
            Err(GrantError::InvalidGrant(msg)) => {
                tracing::warn!("Stored authorization code was rejected: {}", msg);
                self.reauthorize_locked(&mut state).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A token that stays valid for at least the safety margin, refreshing
    /// first when the cached one is too close to expiry.
    pub async fn current_token(&self) -> Result<TokenSet, AuthError> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.token.as_ref() {
            if token.is_fresh(Utc::now(), self.safety_margin) {
                return Ok(token.clone());
            }
            tracing::debug!(expires_at = %token.expires_at, "Access token is stale, refreshing");
        }

        self.refresh_locked(&mut state).await
    }

    /// Unconditionally exchange the refresh token for a new token set
    pub async fn refresh(&self) -> Result<TokenSet, AuthError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Refresh after the resource server rejected `rejected_access_token`.
    /// If another caller already replaced that token, its result is reused.
    pub async fn refresh_rejected(&self, rejected_access_token: &str) -> Result<TokenSet, AuthError> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.token.as_ref() {
            if token.access_token != rejected_access_token {
                tracing::debug!("Token already replaced by a concurrent refresh");
                return Ok(token.clone());
            }
        }

        self.refresh_locked(&mut state).await
    }

    /// Ask the operator for a new authorization code and exchange it.
    /// The only operation that blocks on a human.
    pub async fn interactive_reauthorize(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        self.reauthorize_locked(&mut state).await?;
        Ok(())
    }

    async fn refresh_locked(&self, state: &mut Credential) -> Result<TokenSet, AuthError> {
        let Some(refresh_token) = state.refresh_token().map(str::to_string) else {
            tracing::warn!("No refresh token available");
            return self.reauthorize_locked(state).await;
        };

        match self.oauth.refresh_access_token(&refresh_token).await {
            Ok(tokens) => self.persist_token(state, tokens),
            Err(GrantError::InvalidGrant(msg)) => {
                tracing::warn!("Refresh token rejected ({}), re-authorizing", msg);
                self.reauthorize_locked(state).await
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                Err(e.into())
            }
        }
    }

    async fn reauthorize_locked(&self, state: &mut Credential) -> Result<TokenSet, AuthError> {
        let mut last_error = None;

        for attempt in 1..=MAX_INTERACTIVE_ATTEMPTS {
            let url = self.oauth.authorization_url();
            tracing::info!(attempt, "Requesting interactive authorization: {}", url);

            let authorizer = Arc::clone(&self.authorizer);
            let code = tokio::task::spawn_blocking(move || authorizer.authorize(&url))
                .await
                .map_err(|e| AuthError::Authorization(format!("Authorization prompt failed: {}", e)))??;

            self.store
                .update(|c| c.authorization_code = Some(code.clone()))?;
            state.authorization_code = Some(code.clone());
            tracing::info!("New authorization code saved");

            match self.oauth.exchange_code(&code).await {
                Ok(tokens) => return self.persist_token(state, tokens),
                Err(GrantError::InvalidGrant(msg)) => {
                    tracing::warn!(attempt, "Entered authorization code was rejected: {}", msg);
                    last_error = Some(AuthError::InvalidGrant(msg));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AuthError::InvalidGrant("interactive authorization did not succeed".to_string())
        }))
    }

    fn persist_token(&self, state: &mut Credential, tokens: TokenSet) -> Result<TokenSet, AuthError> {
        self.store.update(|c| c.token = Some(tokens.clone()))?;
        state.token = Some(tokens.clone());
        tracing::info!(expires_at = %tokens.expires_at, "New token saved");
        Ok(tokens)
    }
}
