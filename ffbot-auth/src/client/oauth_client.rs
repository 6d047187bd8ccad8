use chrono::{TimeDelta, Utc};
use oauth2::{
    basic::{BasicClient, BasicErrorResponseType},
    AuthorizationCode, ClientId, ClientSecret, HttpRequest, HttpResponse, RefreshToken,
    RequestTokenError, StandardErrorResponse, TokenResponse, TokenUrl,
};

use crate::client::config::OAuthSettings;
use crate::common::TokenSet;
use crate::error::AuthError;

/// Lifetime assumed when the provider omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: TimeDelta = TimeDelta::hours(1);

/// Provider error ids that mean the presented code or refresh token is dead
const INVALID_GRANT_MARKERS: [&str; 2] = ["INVALID_AUTHORIZATION_CODE", "INVALID_REFRESH_TOKEN"];

type TokenRequestError =
    RequestTokenError<reqwest::Error, StandardErrorResponse<BasicErrorResponseType>>;

/// How a token endpoint call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    /// The refresh token or authorization code can no longer be exchanged
    InvalidGrant(String),
    /// The provider rejected the client id/secret
    InvalidClient(String),
    /// Network failure, 5xx, or a response that could not be understood
    Transient(String),
}

impl std::fmt::Display for GrantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGrant(msg) => write!(f, "invalid grant: {}", msg),
            Self::InvalidClient(msg) => write!(f, "invalid client: {}", msg),
            Self::Transient(msg) => write!(f, "token request failed: {}", msg),
        }
    }
}

impl std::error::Error for GrantError {}

impl From<GrantError> for AuthError {
    fn from(err: GrantError) -> Self {
        match err {
            GrantError::InvalidGrant(msg) => AuthError::InvalidGrant(msg),
            GrantError::InvalidClient(msg) => AuthError::Configuration(msg),
            GrantError::Transient(msg) => AuthError::TransientAuth(msg),
        }
    }
}

impl From<TokenRequestError> for GrantError {
    fn from(err: TokenRequestError) -> Self {
        match err {
            RequestTokenError::ServerResponse(response) => {
                let detail = match response.error_description() {
                    Some(description) => format!("{}: {}", response.error(), description),
                    None => response.error().to_string(),
                };
                match response.error() {
                    BasicErrorResponseType::InvalidGrant => GrantError::InvalidGrant(detail),
                    BasicErrorResponseType::InvalidClient
                    | BasicErrorResponseType::UnauthorizedClient => {
                        GrantError::InvalidClient(detail)
                    }
                    BasicErrorResponseType::Extension(ext) if is_invalid_grant_marker(ext) => {
                        GrantError::InvalidGrant(detail)
                    }
                    _ => GrantError::Transient(detail),
                }
            }
            RequestTokenError::Parse(err, body) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                if is_invalid_grant_marker(&body) {
                    GrantError::InvalidGrant(body)
                } else {
                    GrantError::Transient(format!("unparsable token response: {}: {}", err, body))
                }
            }
            RequestTokenError::Request(err) => GrantError::Transient(err.to_string()),
            RequestTokenError::Other(msg) => GrantError::Transient(msg),
        }
    }
}

fn is_invalid_grant_marker(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    INVALID_GRANT_MARKERS.iter().any(|m| upper.contains(m))
}

// Async HTTP adapter for oauth2 over a shared reqwest client
async fn http_client(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;
    *http_response.headers_mut() = headers;

    Ok(http_response)
}

/// Token endpoint client for the authorization-code + refresh-token grants
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    token_url: TokenUrl,
    authorize_url: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        settings: &OAuthSettings,
    ) -> Result<Self, AuthError> {
        let token_url = TokenUrl::new(settings.token_url.clone())
            .map_err(|e| AuthError::Configuration(format!("Invalid token URL: {}", e)))?;

        url::Url::parse(&settings.authorize_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid authorize URL: {}", e)))?;

        // Token endpoints must not be followed through redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url,
            authorize_url: settings.authorize_url.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            http,
        })
    }

    /// URL the operator opens to grant access and obtain a fresh code
    pub fn authorization_url(&self) -> String {
        match url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        ) {
            Ok(url) => url.to_string(),
            // Validated in `new`
            Err(_) => self.authorize_url.clone(),
        }
    }

    /// Exchange an authorization code for a token set
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, GrantError> {
        let http = self.http.clone();
        let send = move |request: HttpRequest| http_client(http.clone(), request);

        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(self.token_url.clone())
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .add_extra_param("redirect_uri", self.redirect_uri.as_str())
            .request_async(&send)
            .await?;

        let refresh_token = token_result
            .refresh_token()
            .ok_or_else(|| GrantError::Transient("No refresh token in response".to_string()))?
            .secret()
            .to_string();

        let tokens = TokenSet {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token,
            expires_at: expiry_from(token_result.expires_in()),
        };

        tracing::debug!(
            "Successfully exchanged code for tokens, expires_at: {}",
            tokens.expires_at
        );

        Ok(tokens)
    }

    /// Refresh an access token. Providers are not required to rotate the
    /// refresh token; when none comes back the presented one is kept.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet, GrantError> {
        let http = self.http.clone();
        let send = move |request: HttpRequest| http_client(http.clone(), request);

        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(self.token_url.clone())
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .add_extra_param("redirect_uri", self.redirect_uri.as_str())
            .request_async(&send)
            .await?;

        let refresh_token = match token_result.refresh_token() {
            Some(rotated) => rotated.secret().to_string(),
            None => {
                tracing::debug!("No new refresh token given, re-using old");
                refresh_token.to_string()
            }
        };

        let tokens = TokenSet {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token,
            expires_at: expiry_from(token_result.expires_in()),
        };

        tracing::debug!("Successfully refreshed tokens, expires_at: {}", tokens.expires_at);

        Ok(tokens)
    }
}

fn expiry_from(expires_in: Option<std::time::Duration>) -> chrono::DateTime<Utc> {
    let lifetime = expires_in
        .and_then(|d| TimeDelta::from_std(d).ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME);
    Utc::now() + lifetime
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> OAuthSettings {
        OAuthSettings {
            token_url: format!("{}/oauth2/get_token", server.uri()),
            authorize_url: format!("{}/oauth2/request_auth", server.uri()),
            ..OAuthSettings::default()
        }
    }

    #[test]
    fn authorization_url_carries_client_and_oob_redirect() {
        let client = OAuthClient::new("my-client", "s", &OAuthSettings::default()).unwrap();
        let url = url::Url::parse(&client.authorization_url()).unwrap();

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/oauth2/request_auth");
        assert_eq!(params["client_id"], "my-client");
        assert_eq!(params["redirect_uri"], "oob");
        assert_eq!(params["response_type"], "code");
    }

    #[tokio::test]
    async fn refresh_keeps_old_refresh_token_when_not_rotated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let tokens = client.refresh_access_token("old-refresh").await.unwrap();

        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token, "old-refresh");
        assert!(tokens.expires_at > Utc::now() + TimeDelta::minutes(59));
    }

    #[tokio::test]
    async fn exchange_sends_code_and_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("redirect_uri=oob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a",
                "refresh_token": "r",
                "token_type": "bearer",
                "expires_in": 60
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let tokens = client.exchange_code("abc123").await.unwrap();
        assert_eq!(tokens.refresh_token, "r");
    }

    #[tokio::test]
    async fn invalid_grant_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "refresh token expired"
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let err = client.refresh_access_token("dead").await.unwrap_err();
        assert!(matches!(err, GrantError::InvalidGrant(_)), "{err:?}");
    }

    #[tokio::test]
    async fn yahoo_invalid_code_body_is_invalid_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "localizedMessage": "client request is not acceptable or not supported",
                    "errorId": "INVALID_AUTHORIZATION_CODE",
                    "message": "client request is not acceptable or not supported"
                }
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let err = client.exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, GrantError::InvalidGrant(_)), "{err:?}");
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let err = client.refresh_access_token("r").await.unwrap_err();
        assert!(matches!(err, GrantError::Transient(_)), "{err:?}");
        assert!(matches!(AuthError::from(err), AuthError::TransientAuth(_)));
    }

    #[tokio::test]
    async fn invalid_client_maps_to_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
            )
            .mount(&server)
            .await;

        let client = OAuthClient::new("c", "s", &settings(&server)).unwrap();
        let err = client.refresh_access_token("r").await.unwrap_err();
        assert!(matches!(AuthError::from(err), AuthError::Configuration(_)));
    }
}
