use crate::common::Credential;
use crate::error::AuthError;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read/modify/write access to one provider's record in a shared JSON
/// credential file. Other top-level keys are carried through untouched.
pub struct CredentialStore {
    path: PathBuf,
    provider: String,
    write_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, provider: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provider: provider.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn load(&self) -> Result<Credential, AuthError> {
        let document = self.read_document()?;
        self.parse_record(&document)
    }

    /// Apply `update_fn` to the stored credential and write the result back.
    /// Concurrent updates through the same store are serialized.
    pub fn update<F>(&self, update_fn: F) -> Result<Credential, AuthError>
    where
        F: FnOnce(&mut Credential),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut document = self.read_document()?;
        let mut credential = self.parse_record(&document)?;
        update_fn(&mut credential);
        self.merge_record(&mut document, &credential)?;
        self.write_document(&document)?;

        tracing::debug!(
            provider = %self.provider,
            path = %self.path.display(),
            "Credential updated"
        );
        Ok(credential)
    }

    /// Replace the stored credential, creating the file if needed
    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut document = if self.path.exists() {
            self.read_document()?
        } else {
            Map::new()
        };
        self.merge_record(&mut document, credential)?;
        self.write_document(&document)
    }

    fn read_document(&self) -> Result<Map<String, Value>, AuthError> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::Configuration(format!(
                "Failed to read credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        match serde_json::from_str(&json)? {
            Value::Object(map) => Ok(map),
            _ => Err(AuthError::Configuration(format!(
                "Credential file {} must contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn parse_record(&self, document: &Map<String, Value>) -> Result<Credential, AuthError> {
        let record = document.get(&self.provider).ok_or_else(|| {
            AuthError::Configuration(format!(
                "No '{}' entry in {}",
                self.provider,
                self.path.display()
            ))
        })?;

        serde_json::from_value(record.clone()).map_err(|e| {
            AuthError::Configuration(format!("Invalid '{}' credential: {}", self.provider, e))
        })
    }

    fn merge_record(
        &self,
        document: &mut Map<String, Value>,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        let Value::Object(fields) = serde_json::to_value(credential)? else {
            return Err(AuthError::TokenStorage(
                "Credential did not serialize to an object".to_string(),
            ));
        };

        let record = document
            .entry(self.provider.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match record {
            Value::Object(existing) => existing.extend(fields),
            other => *other = Value::Object(fields),
        }
        Ok(())
    }

    /// Write to a sibling temp file, fsync, then rename over the original so a
    /// crash never leaves a truncated credential file behind.
    fn write_document(&self, document: &Map<String, Value>) -> Result<(), AuthError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            AuthError::TokenStorage(format!("Failed to create temp file: {}", e))
        })?;
        serde_json::to_writer_pretty(&mut file, document)?;
        file.write_all(b"\n")?;
        file.as_file()
            .sync_all()
            .map_err(|e| AuthError::TokenStorage(format!("Failed to sync credential: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        file.persist(&self.path).map_err(|e| {
            AuthError::TokenStorage(format!("Failed to save credential: {}", e.error))
        })?;
        Ok(())
    }
}
