//! Best-effort persistence of the last successful connection configuration.
//!
//! The saved profile pre-populates reconnection on the next start. It is a
//! cache, never a source of truth for whether a connection exists; a
//! failure to persist is logged and otherwise ignored by callers.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graphwatch_core::ConnectConfig;

/// Errors from profile storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A persisted connection record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionProfile {
    #[serde(flatten)]
    pub config: ConnectConfig,
    pub saved_at: DateTime<Utc>,
}

/// File-backed store for a single connection profile.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the given configuration as the latest profile.
    pub fn save(&self, config: &ConnectConfig) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let profile = ConnectionProfile {
            config: config.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&profile)?;
        fs::write(&self.path, json)?;

        tracing::debug!(path = %self.path.display(), "connection profile saved");
        Ok(())
    }

    /// Load the saved profile, if one exists. A missing file is `None`;
    /// an unreadable or corrupt file is an error.
    pub fn load(&self) -> Result<Option<ConnectionProfile>, ProfileError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let profile: ConnectionProfile = serde_json::from_str(&json)?;
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwatch_core::Scheme;

    fn sample_config() -> ConnectConfig {
        ConnectConfig {
            scheme: Scheme::Neo4jS,
            host: "db.example.com".into(),
            port: 7687,
            username: "neo4j".into(),
            password: "secret".into(),
            database: Some("movies".into()),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profile.json"));

        let config = sample_config();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.config, config);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested/dir/profile.json"));

        store.save(&sample_config()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn missing_profile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profile.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, "{not json").unwrap();

        let store = ProfileStore::new(path);
        let result = store.load();
        assert!(matches!(result, Err(ProfileError::Serialization(_))));
    }
}
