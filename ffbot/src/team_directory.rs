use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::league::write_atomic;

/// Persistent map of chat user id to the email of the fantasy team manager
/// they play as. Chat commands resolve "my team" through it.
pub struct TeamDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TeamDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every mapping. A missing or unreadable file is an empty directory.
    pub fn all(&self) -> Result<BTreeMap<String, String>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        match serde_json::from_str(&data) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring malformed team map: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    pub fn get(&self, user_id: impl Display) -> Result<Option<String>> {
        Ok(self.all()?.remove(&user_id.to_string()))
    }

    /// Map `user_id` to `email`, returning the updated directory
    pub fn set(&self, user_id: impl Display, email: &str) -> Result<BTreeMap<String, String>> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Team directory lock poisoned"))?;

        let mut map = self.all()?;
        map.insert(user_id.to_string(), email.trim().to_string());

        let json = serde_json::to_string_pretty(&map)?;
        write_atomic(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!(user_id = %user_id, "Team mapping updated");
        Ok(map)
    }
}
