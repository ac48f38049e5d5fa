// Bookshelf - Personal Library Tracker
// Copyright (C) 2026 The Bookshelf Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Store configuration
//!
//! # Database Location
//! - `BOOKSHELF_DB_PATH` environment variable, when set
//! - Desktop (macOS): ~/Library/Application Support/Bookshelf/library.db
//! - Desktop (Linux): ~/.local/share/Bookshelf/library.db
//! - Desktop (Windows): %APPDATA%/Bookshelf/library.db
//! - Anywhere else: `StoreConfig::at` or a JSON config file with `path`

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "BOOKSHELF_DB_PATH";

/// Connection settings for the book store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; `None` opens a private in-memory database
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Some(default_path()),
            max_connections: 5,
            busy_timeout_secs: 30,
            acquire_timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Config for a database file at `path`
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Config for an in-memory database (tests, previews)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ..Self::default()
        }
    }

    /// Default config, honouring `BOOKSHELF_DB_PATH`
    pub fn from_env() -> Self {
        match std::env::var_os(DB_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::at(PathBuf::from(path)),
            _ => Self::default(),
        }
    }

    /// Load a JSON config file; missing keys fall back to defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            StoreError::storage(
                "config",
                format!("Failed to read config {}: {}", path.display(), e),
            )
        })?;
        let config: StoreConfig = serde_json::from_str(&data)?;
        config.validated()
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    fn validated(self) -> Result<Self> {
        if self.max_connections == 0 {
            return Err(StoreError::invalid_input(
                "max_connections must be at least 1",
            ));
        }
        Ok(self)
    }
}

/// Get default database path for the platform
///
/// Callers embedding the store elsewhere pass their own path to [`StoreConfig::at`].
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join("Bookshelf")
            .join("library.db")
    }

    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("Bookshelf")
            .join("library.db")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("Bookshelf").join("library.db")
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("./library.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout(), Duration::from_secs(30));
        assert!(config.path.unwrap().ends_with("library.db"));
        assert!(StoreConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_json_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bookshelf.json");
        std::fs::write(&file, r#"{ "path": "/tmp/shelf.db", "max_connections": 2 }"#).unwrap();

        let config = StoreConfig::from_json_file(&file).unwrap();
        assert_eq!(config.path, Some(PathBuf::from("/tmp/shelf.db")));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_json_file_rejects_zero_connections() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bookshelf.json");
        std::fs::write(&file, r#"{ "max_connections": 0 }"#).unwrap();

        assert!(matches!(
            StoreConfig::from_json_file(&file),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_config_file_is_storage_failure() {
        let err = StoreConfig::from_json_file("/nonexistent/bookshelf.json").unwrap_err();
        assert!(err.is_storage_failure());
    }
}
