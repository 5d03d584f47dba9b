//! Store configuration
//!
//! Central location for the limits and defaults used throughout the crate,
//! plus the on-disk settings that describe how to reach the database.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ===== Content Limits =====

/// Maximum stored title length in characters, marker included
pub const MAX_TITLE_LENGTH: usize = 1000;

/// Maximum stored summary length in characters, marker included
pub const MAX_SUMMARY_LENGTH: usize = 2000;

/// Appended to titles and summaries cut down to their limit
pub const TRUNCATION_MARKER: &str = "...";

/// Maximum tag name length in characters after normalization
pub const MAX_TAG_NAME_LENGTH: usize = 100;

/// Maximum username length in characters
pub const MAX_USERNAME_LENGTH: usize = 64;

// ===== Defaults =====

/// Color assigned to tags created through find-or-create
pub const DEFAULT_TAG_COLOR: &str = "#808080";

/// Color assigned to new notes when the caller gives none
pub const DEFAULT_NOTE_COLOR: &str = "#FFFFFF";

/// Number of tags returned by the popular-tags listing when unspecified
pub const DEFAULT_POPULAR_TAG_LIMIT: i64 = 10;

// ===== Connection Pool =====

/// Default number of pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time a statement waits on a locked database, in seconds
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

fn default_database_path() -> PathBuf {
    PathBuf::from("notekeeper.db")
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_busy_timeout_secs() -> u64 {
    DEFAULT_BUSY_TIMEOUT_SECS
}

/// Settings for opening the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl StoreSettings {
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// Load settings from disk or write the defaults if the file is missing
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Store settings not found at {:?}, writing defaults", path);
            let default = Self::default();
            default.save(path).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(path).await?;
        let settings: StoreSettings = serde_json::from_str(&content)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        tracing::info!("Store settings saved to {:?}", path);

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(AppError::Validation(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.busy_timeout_secs == 0 {
            return Err(AppError::Validation(
                "busy_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
