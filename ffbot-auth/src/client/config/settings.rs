use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AuthError;

/// Token endpoint and credential file settings, the `[auth]` section of the
/// bot configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthSettings {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Top-level key of the credential file holding this provider's record
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: i64,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("auth.json")
}

fn default_provider() -> String {
    "yahoo".to_string()
}

fn default_token_url() -> String {
    "https://api.login.yahoo.com/oauth2/get_token".to_string()
}

fn default_authorize_url() -> String {
    "https://api.login.yahoo.com/oauth2/request_auth".to_string()
}

fn default_redirect_uri() -> String {
    "oob".to_string()
}

fn default_safety_margin() -> i64 {
    300
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            provider: default_provider(),
            token_url: default_token_url(),
            authorize_url: default_authorize_url(),
            redirect_uri: default_redirect_uri(),
            safety_margin_secs: default_safety_margin(),
        }
    }
}

impl OAuthSettings {
    pub fn safety_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.safety_margin_secs)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.provider.is_empty() {
            return Err(AuthError::Configuration("auth.provider is required".to_string()));
        }
        for (name, value) in [
            ("auth.token_url", &self.token_url),
            ("auth.authorize_url", &self.authorize_url),
        ] {
            if !value.starts_with("http") {
                return Err(AuthError::Configuration(format!(
                    "{} must be a valid HTTP(S) URL",
                    name
                )));
            }
        }
        if self.safety_margin_secs < 0 {
            return Err(AuthError::Configuration(
                "auth.safety_margin_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_yahoo_out_of_band_flow() {
        let settings = OAuthSettings::default();
        assert_eq!(settings.provider, "yahoo");
        assert_eq!(settings.redirect_uri, "oob");
        assert_eq!(settings.safety_margin(), chrono::Duration::minutes(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_token_url() {
        let settings = OAuthSettings {
            token_url: "ftp://example.com/token".to_string(),
            ..OAuthSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(AuthError::Configuration(_))
        ));
    }
}
