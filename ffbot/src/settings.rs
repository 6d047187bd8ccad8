use anyhow::{bail, Context, Result};
use config::{Config, ConfigError, File};
use ffbot_auth::OAuthSettings;
use serde::Deserialize;
use std::path::PathBuf;

use crate::scheduler::CronSchedule;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub auth: OAuthSettings,

    #[serde(default)]
    pub api: ApiSettings,

    pub league: LeagueSettings,

    /// Chat user id to manager email map
    #[serde(default = "default_team_map_path")]
    pub team_map_path: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub channels: ChannelSettings,

    #[serde(default)]
    pub schedules: ScheduleSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueSettings {
    pub id: u64,

    /// Game code whose current season holds the league
    #[serde(default = "default_game")]
    pub game: String,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSettings {
    #[serde(default = "default_general_channel")]
    pub general: String,

    #[serde(default = "default_trades_channel")]
    pub trades: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            general: default_general_channel(),
            trades: default_trades_channel(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    #[serde(default = "default_trade_watch")]
    pub trade_watch: String,

    #[serde(default = "default_league_sync")]
    pub league_sync: String,

    #[serde(default = "default_week_in_review")]
    pub week_in_review: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            trade_watch: default_trade_watch(),
            league_sync: default_league_sync(),
            week_in_review: default_week_in_review(),
        }
    }
}

fn default_base_url() -> String {
    yfantasy_api::BASE_URL.to_string()
}

fn default_game() -> String {
    "nfl".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("league.json")
}

fn default_team_map_path() -> PathBuf {
    PathBuf::from("discmap.json")
}

fn default_log_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ffbot")
        .join("logs")
}

fn default_general_channel() -> String {
    "general".to_string()
}

fn default_trades_channel() -> String {
    "trades".to_string()
}

fn default_trade_watch() -> String {
    "*/5 * * * *".to_string()
}

fn default_league_sync() -> String {
    "0 * * * *".to_string()
}

fn default_week_in_review() -> String {
    "0 15 * * 3".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("FFBOT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Load `config_path` (optional) layered under `FFBOT__*` environment variables
    pub fn from_file(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FFBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        self.auth
            .validate()
            .context("Invalid [auth] configuration")?;

        if !self.api.base_url.starts_with("http") {
            bail!("api.base_url must be a valid HTTP(S) URL");
        }
        if self.league.id == 0 {
            bail!("league.id is required");
        }
        if self.league.game.trim().is_empty() {
            bail!("league.game is required");
        }

        for (name, expr) in [
            ("schedules.trade_watch", &self.schedules.trade_watch),
            ("schedules.league_sync", &self.schedules.league_sync),
            ("schedules.week_in_review", &self.schedules.week_in_review),
        ] {
            CronSchedule::parse(expr).with_context(|| format!("{} is invalid", name))?;
        }

        Ok(())
    }
}
