mod document;
pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
mod resource;

pub use crate::document::{extract, xml_to_document, ROOT_ELEMENT};
pub use crate::error::FantasyApiError;
pub use crate::resource::Resource;

use endpoints::{Endpoint, ResourceKind};
use ffbot_auth::{AuthError, TokenManager, TokenSet};
use repositories::*;
use reqwest::{header, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;

pub const BASE_URL: &str = "https://fantasysports.yahooapis.com/fantasy/v2/";
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A successful (2xx) response body, not yet converted
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawPayload {
    async fn from_response(response: reqwest::Response) -> Result<Self, FantasyApiError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FantasyApiError::Status { status, body });
        }

        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    /// Whole response as a nested document. JSON bodies are parsed as-is,
    /// everything else is treated as XML.
    pub fn document(&self) -> Result<Value, FantasyApiError> {
        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"));

        if is_json {
            serde_json::from_str(&self.body).map_err(|e| FantasyApiError::Document(e.to_string()))
        } else {
            xml_to_document(&self.body)
        }
    }
}

/// Authenticated, read-only access to the fantasy API.
///
/// Every request carries the bearer token from the shared [`TokenManager`].
/// A 401 forces one refresh and one retry of the same request.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenManager>,
}

impl Client {
    pub fn new(base_url: &str, tokens: Arc<TokenManager>) -> Result<Self, FantasyApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| FantasyApiError::Configuration(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(FantasyApiError::Configuration(format!(
                "Base URL must be http(s): {}",
                base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, FantasyApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FantasyApiError::Configuration(format!("Invalid resource path '{}': {}", path, e)))
    }

    /// Current token; a transient token endpoint failure is retried once
    async fn token(&self) -> Result<TokenSet, FantasyApiError> {
        match self.tokens.current_token().await {
            Err(AuthError::TransientAuth(msg)) => {
                tracing::warn!("Token endpoint unavailable ({}), retrying once", msg);
                Ok(self.tokens.current_token().await?)
            }
            other => Ok(other?),
        }
    }

    pub async fn get(&self, path: &str) -> Result<RawPayload, FantasyApiError> {
        let url = self.url(path)?;
        let token = self.token().await?;

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return RawPayload::from_response(response).await;
        }

        tracing::warn!(path, "Access token rejected, refreshing and retrying once");
        let token = self.tokens.refresh_rejected(&token.access_token).await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        RawPayload::from_response(response).await
    }

    /// Always fails: the API credential is read-only. No request is sent.
    pub async fn post(&self, path: &str, _body: &Value) -> Result<RawPayload, FantasyApiError> {
        tracing::warn!(path, "Rejected POST request");
        Err(FantasyApiError::UnsupportedOperation(
            "POST requests are not supported by the read-only API credential",
        ))
    }

    /// GET an endpoint and dispatch the response on its resource kind
    pub async fn fetch<E: Endpoint>(&self, endpoint: &E) -> Result<Resource, FantasyApiError> {
        let path = endpoint.path();
        let kind = endpoint.kind();
        let document = self.get(&path).await?.document()?;
        tracing::debug!(%kind, path = %path, "Fetched resource");

        Ok(Resource::new(kind, extract(document, kind.tag(), endpoint.nest())))
    }

    /// GET a raw path. The kind comes from its first segment; paths outside
    /// the known kinds yield [`Resource::Untyped`].
    pub async fn fetch_path(&self, path: &str) -> Result<Resource, FantasyApiError> {
        let document = self.get(path).await?.document()?;

        match ResourceKind::from_path(path) {
            Some(kind) => Ok(Resource::new(kind, extract(document, kind.tag(), &[]))),
            None => {
                let tag = path
                    .trim_start_matches('/')
                    .split(['/', ';'])
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let document = extract(document, &tag, &[]);
                Ok(Resource::Untyped { tag, document })
            }
        }
    }
}

/// Entry point for building endpoints
pub struct Request;

impl Request {
    pub fn games() -> GameRepository {
        GameRepository::new()
    }

    pub fn league(league_key: impl Into<endpoints::LeagueKey>) -> LeagueRepository {
        LeagueRepository::new(league_key.into())
    }

    pub fn team(team_key: impl Into<endpoints::TeamKey>) -> TeamRepository {
        TeamRepository::new(team_key.into())
    }
}
