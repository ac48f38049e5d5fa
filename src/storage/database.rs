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


//! Database connection and management
//!
//! This module handles database connection pooling, initialization, and maintenance.
//!
//! # SQLite Configuration
//! - WAL mode for better concurrency
//! - Foreign keys enabled
//! - Incremental auto-vacuum for space efficiency
//! - Normal synchronous mode (balance safety/speed)

use crate::error::{Result, StoreError};
use crate::storage::config::StoreConfig;
use sqlx::{
    sqlite::{
        SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
        SqliteSynchronous,
    },
    ConnectOptions,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Database manager - handles connection pooling and operations
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>, // None for in-memory databases
}

impl Database {
    /// Open the database described by `config` and bring its schema up to date
    ///
    /// # Errors
    /// - `StorageFailure` (operation "open") if the directory or file can't be
    ///   created or SQLite refuses the connection
    /// - `StorageFailure` (operation "migrate") if the schema step fails or the
    ///   file was written by a newer build; the pool is closed and no handle
    ///   is returned
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let db = match &config.path {
            Some(path) => Self::connect_file(path, config).await,
            None => Self::connect_memory().await,
        }
        .map_err(|e| e.during("open"))?;

        if let Err(e) = db.migrate().await {
            log::error!("Schema step failed, closing database: {}", e);
            db.close().await;
            return Err(e);
        }

        log::info!(
            "Book database ready at {}",
            db.path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );

        Ok(db)
    }

    /// Create new database connection with migrations
    ///
    /// # Arguments
    /// * `database_path` - Path to SQLite database file (will be created if doesn't exist)
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        Self::open(&StoreConfig::at(database_path)).await
    }

    /// Create in-memory database for testing
    pub async fn new_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory()).await
    }

    async fn connect_file(path: &Path, config: &StoreConfig) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::storage(
                        "open",
                        format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ),
                    )
                })?;
            }
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // Only takes effect on a new file; sqlx issues it ahead of journal_mode
            .auto_vacuum(SqliteAutoVacuum::Incremental)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout())
            // Disable logging for production use
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(connect_opts)
            .await?;

        Ok(Self {
            pool,
            path: Some(path.to_path_buf()),
        })
    }

    async fn connect_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .auto_vacuum(SqliteAutoVacuum::Incremental)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .disable_statement_logging();

        // Every connection to :memory: is its own database, so keep exactly one
        // and never let the pool recycle it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;

        Ok(Self { pool, path: None })
    }

    /// Run database migrations
    ///
    /// Migrations are run automatically when opening the database.
    pub async fn migrate(&self) -> Result<()> {
        crate::storage::migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| match e {
                StoreError::StorageFailure { .. } => e.during("migrate"),
                other => StoreError::storage("migrate", other),
            })
    }

    /// Current schema version
    pub async fn schema_version(&self) -> Result<i64> {
        crate::storage::migrations::schema_version(&self.pool).await
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path
    ///
    /// Returns `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close database and release all connections
    ///
    /// This will wait for all active connections to finish before closing.
    pub async fn close(&self) {
        self.pool.close().await;
        log::info!("Book database closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Rebuild the whole file, dropping every free page
    ///
    /// Holds an exclusive lock for the duration; prefer
    /// [`incremental_vacuum`](Self::incremental_vacuum) on a live library.
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).during("vacuum"))?;
        log::info!("Book database vacuumed");
        Ok(())
    }

    /// Hand up to `pages` free pages back to the filesystem (0 = all of them)
    ///
    /// Returns how many pages were released.
    pub async fn incremental_vacuum(&self, pages: u32) -> Result<u64> {
        let before = self.stats().await?.freelist_count;

        let query = match pages {
            0 => "PRAGMA incremental_vacuum".to_string(),
            n => format!("PRAGMA incremental_vacuum({})", n),
        };
        // The pragma yields one row per freed page; drain them all so it runs to completion
        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).during("vacuum"))?;

        let after = self.stats().await?.freelist_count;
        let released = before.saturating_sub(after);
        log::debug!("Incremental vacuum released {} pages", released);
        Ok(released)
    }

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await?;

        Ok(DatabaseStats {
            page_count: page_count as u64,
            page_size: page_size as u64,
            freelist_count: freelist_count as u64,
            total_size: (page_count * page_size) as u64,
            unused_size: (freelist_count * page_size) as u64,
        })
    }

    /// Checkpoint WAL file to main database
    pub async fn checkpoint(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Export database to file
    ///
    /// Creates a copy of the database at the specified path.
    /// Automatically checkpoints WAL before export.
    pub async fn export<P: AsRef<Path>>(&self, output_path: P) -> Result<()> {
        let source_path = self.path.as_ref().ok_or_else(|| {
            StoreError::invalid_input("Cannot export in-memory database")
        })?;

        self.checkpoint().await?;

        tokio::fs::copy(source_path, output_path.as_ref())
            .await
            .map_err(|e| {
                StoreError::storage(
                    "export",
                    format!(
                        "Failed to export database to {}: {}",
                        output_path.as_ref().display(),
                        e
                    ),
                )
            })?;

        Ok(())
    }

    /// Refresh query planner statistics for the `Books` indexes
    pub async fn optimize(&self) -> Result<()> {
        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).during("optimize"))?;
        Ok(())
    }

    /// Check database integrity
    ///
    /// Runs SQLite integrity check and returns true if database is okay.
    pub async fn check_integrity(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }

    /// Quick integrity check
    pub async fn quick_check(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA quick_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }
}

const VACUUM_THRESHOLD_PERCENT: f64 = 20.0;

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Total number of pages in database
    pub page_count: u64,
    /// Size of each page in bytes
    pub page_size: u64,
    /// Number of free pages (unused space)
    pub freelist_count: u64,
    /// Total size of database (page_count * page_size)
    pub total_size: u64,
    /// Unused space (freelist_count * page_size)
    pub unused_size: u64,
}

impl DatabaseStats {
    /// Get percentage of unused space
    pub fn unused_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.unused_size as f64 / self.total_size as f64) * 100.0
        }
    }

    /// More than a fifth of the file is free pages
    pub fn should_vacuum(&self) -> bool {
        self.unused_percentage() > VACUUM_THRESHOLD_PERCENT
    }
}
