use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token set returned by the provider's token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "epoch_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// True while the access token can still be handed out, i.e. `now` is
    /// before `expires_at - margin`.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        now < self.expires_at - margin
    }
}

/// Persisted client credential for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    #[serde(rename = "code", default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenSet>,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_code: None,
            token: None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|t| t.refresh_token.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Serializes as whole seconds; accepts integer or fractional seconds on read.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(de::Error::custom("expires_at is not a finite number"));
        }
        DateTime::from_timestamp(seconds.trunc() as i64, 0)
            .ok_or_else(|| de::Error::custom(format!("expires_at out of range: {}", seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reads_fractional_expiry_written_by_older_tooling() {
        let json = r#"{
            "client_id": "id",
            "client_secret": "secret",
            "code": "abc",
            "token": {
                "access_token": "a",
                "refresh_token": "r",
                "expires_at": 1700000000.75,
                "token_type": "bearer"
            }
        }"#;
        let credential: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(credential.authorization_code.as_deref(), Some("abc"));
        let token = credential.token.unwrap();
        assert_eq!(token.expires_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn writes_code_key_and_integer_expiry() {
        let mut credential = Credential::new("id", "secret");
        credential.authorization_code = Some("xyz".to_string());
        credential.token = Some(TokenSet {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        });

        let value = serde_json::to_value(&credential).unwrap();
        assert_eq!(value["code"], "xyz");
        assert_eq!(value["token"]["expires_at"], 1_700_000_000);
        assert!(value.get("authorization_code").is_none());
    }

    #[test]
    fn freshness_respects_margin() {
        let now = Utc::now();
        let token = TokenSet {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: now + Duration::minutes(3),
        };
        assert!(token.is_fresh(now, Duration::minutes(1)));
        assert!(!token.is_fresh(now, Duration::minutes(5)));
    }

    #[test]
    fn empty_refresh_token_is_unusable() {
        let mut credential = Credential::new("id", "secret");
        assert!(credential.refresh_token().is_none());
        credential.token = Some(TokenSet {
            access_token: "a".into(),
            refresh_token: String::new(),
            expires_at: Utc::now(),
        });
        assert!(credential.refresh_token().is_none());
    }
}
