use ffbot_auth::{AuthError, Authorizer, CredentialStore, OAuthSettings, TokenManager};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yfantasy_api::{Client, FantasyApiError, Request, Resource};

struct NoOperator;

impl Authorizer for NoOperator {
    fn authorize(&self, _authorization_url: &str) -> Result<String, AuthError> {
        Err(AuthError::Authorization("no operator in tests".to_string()))
    }
}

const GAME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fantasy_content xml:lang="en-US" time="12ms">
  <game>
    <game_key>423</game_key>
    <code>nfl</code>
    <season>2023</season>
  </game>
</fantasy_content>"#;

const STANDINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fantasy_content>
  <league>
    <league_key>423.l.1</league_key>
    <standings>
      <teams count="2">
        <team><team_key>423.l.1.t.1</team_key></team>
        <team><team_key>423.l.1.t.2</team_key></team>
      </teams>
    </standings>
  </league>
</fantasy_content>"#;

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

/// Token manager holding a valid `access` token; refreshes go to the mock
fn token_manager(server: &MockServer, dir: &tempfile::TempDir, access: &str) -> Arc<TokenManager> {
    let expires_at = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    let path: PathBuf = dir.path().join("auth.json");
    let document = json!({
        "yahoo": {
            "client_id": "c",
            "client_secret": "s",
            "token": {"access_token": access, "refresh_token": "r1", "expires_at": expires_at}
        }
    });
    std::fs::write(&path, document.to_string()).unwrap();

    let settings = OAuthSettings {
        credentials_path: path.clone(),
        token_url: format!("{}/oauth2/get_token", server.uri()),
        authorize_url: format!("{}/oauth2/request_auth", server.uri()),
        ..OAuthSettings::default()
    };
    let manager = TokenManager::new(
        CredentialStore::new(&path, "yahoo"),
        &settings,
        Arc::new(NoOperator),
    )
    .unwrap();
    Arc::new(manager)
}

fn client(server: &MockServer, tokens: Arc<TokenManager>) -> Client {
    Client::new(&format!("{}/fantasy/v2", server.uri()), tokens).unwrap()
}

async fn mount_token_endpoint(server: &MockServer, access: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/get_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_sends_bearer_token_and_dispatches_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/game/nfl"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(xml(GAME_XML))
        .expect(1)
        .mount(&server)
        .await;
    mount_token_endpoint(&server, "unused", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let resource = client.fetch(&Request::games().get("nfl")).await.unwrap();
    assert!(matches!(resource, Resource::Game(_)));
    assert_eq!(resource.str_field("code").as_deref(), Some("nfl"));
    assert_eq!(resource.str_field("season").as_deref(), Some("2023"));
}

#[tokio::test]
async fn test_fetch_follows_nest_for_standings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/league/423.l.1/standings"))
        .respond_with(xml(STANDINGS_XML))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let resource = client
        .fetch(&Request::league("423.l.1").standings())
        .await
        .unwrap();
    assert!(matches!(resource, Resource::Standings(_)));
    assert_eq!(resource.document()["teams"]["@count"], "2");
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/game/nfl"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token_expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/game/nfl"))
        .and(header("authorization", "Bearer new"))
        .respond_with(xml(GAME_XML))
        .expect(1)
        .mount(&server)
        .await;
    mount_token_endpoint(&server, "new", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let tokens = token_manager(&server, &dir, "old");
    let client = client(&server, tokens.clone());

    let payload = client.get("game/nfl").await.unwrap();
    assert!(payload.status.is_success());
    assert_eq!(tokens.current_token().await.unwrap().access_token, "new");

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("auth.json")).unwrap())
            .unwrap();
    assert_eq!(stored["yahoo"]["token"]["access_token"], "new");
}

#[tokio::test]
async fn test_second_unauthorized_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/game/nfl"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .expect(2)
        .mount(&server)
        .await;
    mount_token_endpoint(&server, "new", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "old"));

    let err = client.get("game/nfl").await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    assert!(matches!(err, FantasyApiError::Status { ref body, .. } if body == "denied"));
}

#[tokio::test]
async fn test_server_error_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/league/423.l.1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    mount_token_endpoint(&server, "unused", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let err = client.fetch(&Request::league("423.l.1").get()).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn test_post_is_rejected_without_network_call() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let err = client
        .post("league/423.l.1/transactions", &json!({"type": "add"}))
        .await
        .unwrap_err();
    assert!(matches!(err, FantasyApiError::UnsupportedOperation(_)));

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_unknown_path_yields_untyped_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/users;use_login=1/games"))
        .respond_with(xml(
            "<fantasy_content><users count=\"1\"><user><guid>G1</guid></user></users></fantasy_content>",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let resource = client.fetch_path("users;use_login=1/games").await.unwrap();
    assert_eq!(resource.kind(), None);
    assert_eq!(resource.tag(), "users");
    assert_eq!(resource.document()["user"]["guid"], "G1");
}

#[tokio::test]
async fn test_json_payload_is_parsed_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/game/nfl"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"fantasy_content": {"game": {"code": "nfl"}}})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, token_manager(&server, &dir, "a1"));

    let resource = client.fetch(&Request::games().get("nfl")).await.unwrap();
    assert_eq!(resource.str_field("code").as_deref(), Some("nfl"));
}

#[test]
fn test_rejects_non_http_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.json");
    std::fs::write(
        &path,
        json!({"yahoo": {"client_id": "c", "client_secret": "s"}}).to_string(),
    )
    .unwrap();
    let tokens = TokenManager::new(
        CredentialStore::new(&path, "yahoo"),
        &OAuthSettings::default(),
        Arc::new(NoOperator),
    )
    .unwrap();

    let err = Client::new("ftp://example.com/", Arc::new(tokens)).err().unwrap();
    assert!(matches!(err, FantasyApiError::Configuration(_)));
}
