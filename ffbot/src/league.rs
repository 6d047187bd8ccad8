use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::fs;

#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io(e) => write!(f, "IO error: {}", e),
            CacheError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err)
    }
}

/// League facts that change rarely: the season's game, the league settings
/// and every team. Refreshed hourly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeagueSnapshot {
    pub game: Value,
    pub league: Value,
    pub teams: Vec<Value>,
    pub cached_at: i64, // Unix timestamp
}

pub(crate) fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

impl LeagueSnapshot {
    pub fn new(game: Value, league: Value, teams: Vec<Value>) -> Self {
        Self {
            game,
            league,
            teams,
            cached_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn league_key(&self) -> Option<&str> {
        text(&self.league["league_key"])
    }

    pub fn name(&self) -> Option<&str> {
        text(&self.league["name"])
    }

    pub fn current_week(&self) -> Option<u32> {
        text(&self.league["current_week"])?.parse().ok()
    }

    pub fn end_week(&self) -> Option<u32> {
        text(&self.league["end_week"])?.parse().ok()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        text(&self.league["start_date"])?.parse().ok()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        text(&self.league["end_date"])?.parse().ok()
    }

    /// `start_date <= today <= end_date`; false when either date is unknown
    pub fn season_open(&self, today: NaiveDate) -> bool {
        match (self.start_date(), self.end_date()) {
            (Some(start), Some(end)) => start <= today && today <= end,
            _ => false,
        }
    }

    /// Team whose (first) manager has `email`
    pub fn team_by_email(&self, email: &str) -> Option<&Value> {
        self.teams.iter().find(|team| {
            let managers = &team["managers"]["manager"];
            let listed = match managers {
                Value::Array(list) => list.iter().collect::<Vec<_>>(),
                other => vec![other],
            };
            listed
                .iter()
                .any(|m| text(&m["email"]).is_some_and(|e| e.eq_ignore_ascii_case(email)))
        })
    }
}

/// Snapshot persisted as pretty JSON at one path
#[derive(Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file is missing or empty
    pub async fn load(&self) -> Result<Option<LeagueSnapshot>, CacheError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(None);
        }
        let cached: LeagueSnapshot = serde_json::from_str(&data)?;
        Ok(Some(cached))
    }

    /// Replace the file atomically: temp file in the same directory, fsync, rename
    pub async fn store(&self, snapshot: &LeagueSnapshot) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))??;

        tracing::debug!(path = %self.path.display(), "League snapshot written");
        Ok(())
    }
}

pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// The in-memory snapshot shared between jobs
#[derive(Clone, Default)]
pub struct SharedLeague {
    inner: Arc<RwLock<Option<LeagueSnapshot>>>,
}

impl SharedLeague {
    pub fn get(&self) -> Option<LeagueSnapshot> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn replace(&self, snapshot: LeagueSnapshot) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(snapshot);
        }
    }

    pub fn season_open(&self, today: NaiveDate) -> bool {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.season_open(today)))
            .unwrap_or(false)
    }
}
