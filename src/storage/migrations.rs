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


//! Database migrations
//!
//! This module handles database schema creation and migrations.
//!
//! # Migration Strategy
//! Migrations are plain SQL strings applied at runtime when the store opens,
//! so a library file created by any earlier build is upgraded in place.
//!
//! Each migration runs inside one transaction together with its `_migrations`
//! row, so a migration is either fully applied and recorded or not at all.
//! The schema version is the highest recorded migration id. Any change to the
//! `Books` indexes needs a new entry in [`MIGRATIONS`].

use crate::error::{Result, StoreError};
use sqlx::{Executor, SqlitePool};

/// Schema version this build expects
pub const SCHEMA_VERSION: i64 = 1;

/// A single schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations, in application order
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: INITIAL_SCHEMA,
}];

/// Run all database migrations
///
/// Refuses to touch a database written by a newer build. Failures are
/// `StorageFailure` with operation "migrate".
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create migrations tracking table
    create_migrations_table(pool).await?;

    let current = schema_version(pool).await?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::storage(
            "migrate",
            format!(
                "database schema version {} is newer than supported version {}",
                current, SCHEMA_VERSION
            ),
        ));
    }

    for migration in MIGRATIONS {
        run_migration(pool, migration).await?;
    }

    Ok(())
}

/// Highest applied migration id, 0 for a fresh database
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    // Check if migration has been applied
    let applied: Option<i64> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(migration.version)
        .fetch_optional(&mut *tx)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    log::info!(
        "Applying schema migration {} ({})",
        migration.version,
        migration.name
    );

    (&mut *tx).execute(migration.sql).await.map_err(|e| {
        StoreError::storage(
            "migrate",
            format!(
                "migration {} ({}) failed: {}",
                migration.version, migration.name, e
            ),
        )
    })?;

    // Record migration
    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Initial schema: the `Books` collection, its single-value indexes and the
/// `BookGenres` inverted table backing the multi-value genre index.
const INITIAL_SCHEMA: &str = r#"
-- Books table: one row per book, keyed by the caller-generated id
CREATE TABLE IF NOT EXISTS Books (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    genres TEXT NOT NULL DEFAULT '[]',          -- JSON array, order preserved
    status TEXT NOT NULL,                       -- to-read | reading | read
    start_date TEXT,                            -- YYYY-MM-DD
    end_date TEXT,                              -- YYYY-MM-DD
    rating INTEGER,
    notes TEXT,
    description TEXT,
    cover_url TEXT,
    page_count INTEGER,
    date_added TEXT NOT NULL,
    is_recommendation INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_books_title ON Books(title);
CREATE INDEX IF NOT EXISTS idx_books_author ON Books(author);
CREATE INDEX IF NOT EXISTS idx_books_status ON Books(status);
CREATE INDEX IF NOT EXISTS idx_books_end_date ON Books(end_date);
CREATE INDEX IF NOT EXISTS idx_books_date_added ON Books(date_added);
CREATE INDEX IF NOT EXISTS idx_books_rating ON Books(rating);

-- Multi-value genre index: one row per distinct genre a book holds
CREATE TABLE IF NOT EXISTS BookGenres (
    genre TEXT NOT NULL,
    book_id TEXT NOT NULL,
    PRIMARY KEY (genre, book_id),
    FOREIGN KEY (book_id) REFERENCES Books(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_book_genres_book_id ON BookGenres(book_id);
"#;
