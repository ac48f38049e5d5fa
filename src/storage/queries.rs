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


//! Database query functions
//!
//! Repository functions over a `SqlitePool`. [`BookStore`](crate::storage::BookStore)
//! is the owned handle most callers use; these are the building blocks.
//!
//! # Query Patterns
//! - Async/await for all database operations
//! - Every write runs in its own transaction covering `Books` and `BookGenres`,
//!   so a reader never sees a row without its genre entries or the reverse
//! - No transaction spans two calls: read-modify-write is last-write-wins

use crate::error::{Result, StoreError};
use crate::storage::models::*;
use futures_util::TryStreamExt;
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;

const SELECT_BOOKS: &str = r#"
    SELECT id, title, author, genres, status, start_date, end_date, rating,
           notes, description, cover_url, page_count, date_added, is_recommendation
    FROM Books
"#;

fn collect_books(rows: Vec<BookRow>) -> Result<Vec<Book>> {
    rows.into_iter().map(Book::try_from).collect()
}

// ============================================================================
// WRITES
// ============================================================================

/// Insert a new book
///
/// Returns the id of the inserted book. Fails with `DuplicateKey` when the id
/// is already stored; the stored record is left untouched.
pub async fn insert_book(pool: &SqlitePool, book: &Book) -> Result<String> {
    if !book.has_id() {
        log::warn!("Rejected insert of '{}': no id", book.title);
        return Err(StoreError::MissingKey);
    }

    let mut tx = pool.begin().await.map_err(|e| storage_failure("insert", e))?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO Books (
            id, title, author, genres, status, start_date, end_date, rating,
            notes, description, cover_url, page_count, date_added, is_recommendation
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(Json(&book.genres))
    .bind(book.status.as_str())
    .bind(book.start_date)
    .bind(book.end_date)
    .bind(book.rating)
    .bind(&book.notes)
    .bind(&book.description)
    .bind(&book.cover_url)
    .bind(book.page_count)
    .bind(book.date_added)
    .bind(book.is_recommendation)
    .execute(&mut *tx)
    .await;

    if let Err(err) = inserted {
        if is_unique_violation(&err) {
            log::warn!("Rejected insert: book '{}' already exists", book.id);
            return Err(StoreError::DuplicateKey(book.id.clone()));
        }
        return Err(storage_failure("insert", err));
    }

    write_genre_entries(&mut tx, &book.id, &book.genres)
        .await
        .map_err(|e| storage_failure("insert", e))?;

    tx.commit().await.map_err(|e| storage_failure("insert", e))?;

    log::debug!("Book added: {}", book.id);
    Ok(book.id.clone())
}

/// Replace a stored book with `book`, keyed by its id
///
/// Whole-record replace: every column takes the new value, including `None`s.
/// A record without an id is rejected with `MissingKey`; an id that is not
/// stored yet is written as a new row.
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<String> {
    if !book.has_id() {
        log::warn!("Rejected update of '{}': no id", book.title);
        return Err(StoreError::MissingKey);
    }

    let mut tx = pool.begin().await.map_err(|e| storage_failure("update", e))?;

    sqlx::query(
        r#"
        INSERT INTO Books (
            id, title, author, genres, status, start_date, end_date, rating,
            notes, description, cover_url, page_count, date_added, is_recommendation
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            author = excluded.author,
            genres = excluded.genres,
            status = excluded.status,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            rating = excluded.rating,
            notes = excluded.notes,
            description = excluded.description,
            cover_url = excluded.cover_url,
            page_count = excluded.page_count,
            date_added = excluded.date_added,
            is_recommendation = excluded.is_recommendation
        "#,
    )
    .bind(&book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(Json(&book.genres))
    .bind(book.status.as_str())
    .bind(book.start_date)
    .bind(book.end_date)
    .bind(book.rating)
    .bind(&book.notes)
    .bind(&book.description)
    .bind(&book.cover_url)
    .bind(book.page_count)
    .bind(book.date_added)
    .bind(book.is_recommendation)
    .execute(&mut *tx)
    .await
    .map_err(|e| storage_failure("update", e))?;

    sqlx::query("DELETE FROM BookGenres WHERE book_id = ?")
        .bind(&book.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_failure("update", e))?;

    write_genre_entries(&mut tx, &book.id, &book.genres)
        .await
        .map_err(|e| storage_failure("update", e))?;

    tx.commit().await.map_err(|e| storage_failure("update", e))?;

    log::debug!("Book updated: {}", book.id);
    Ok(book.id.clone())
}

/// Delete a book and its genre entries
///
/// Deleting an id that isn't stored succeeds. Returns whether a row was removed.
pub async fn delete_book(pool: &SqlitePool, id: &str) -> Result<bool> {
    let mut tx = pool.begin().await.map_err(|e| storage_failure("delete", e))?;

    sqlx::query("DELETE FROM BookGenres WHERE book_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_failure("delete", e))?;

    let result = sqlx::query("DELETE FROM Books WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_failure("delete", e))?;

    tx.commit().await.map_err(|e| storage_failure("delete", e))?;

    let removed = result.rows_affected() > 0;
    log::debug!("Book {} deleted (existed: {})", id, removed);
    Ok(removed)
}

/// Delete every book (for testing and CLI resets)
pub async fn clear_library(pool: &SqlitePool) -> Result<u64> {
    let mut tx = pool.begin().await.map_err(|e| storage_failure("clear", e))?;

    sqlx::query("DELETE FROM BookGenres")
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_failure("clear", e))?;
    let result = sqlx::query("DELETE FROM Books")
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_failure("clear", e))?;

    tx.commit().await.map_err(|e| storage_failure("clear", e))?;

    Ok(result.rows_affected())
}

/// One `BookGenres` row per distinct genre string
async fn write_genre_entries(
    tx: &mut Transaction<'_, Sqlite>,
    book_id: &str,
    genres: &[String],
) -> std::result::Result<(), sqlx::Error> {
    for genre in genres {
        sqlx::query("INSERT OR IGNORE INTO BookGenres (genre, book_id) VALUES (?, ?)")
            .bind(genre)
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

// ============================================================================
// READS
// ============================================================================

/// Find book by id
pub async fn find_book_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Book>> {
    let row = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOKS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| storage_failure("get", e))?;

    row.map(Book::try_from).transpose()
}

/// List every book in insertion order
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOKS} ORDER BY rowid"))
        .fetch_all(pool)
        .await
        .map_err(|e| storage_failure("get_all", e))?;

    collect_books(rows)
}

/// List books with the given status, through `idx_books_status`
pub async fn list_books_by_status(pool: &SqlitePool, status: ReadingStatus) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "{SELECT_BOOKS} INDEXED BY idx_books_status WHERE status = ?"
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("get_by_status", e))?;

    collect_books(rows)
}

/// List books whose genres contain exactly `genre`, through `BookGenres`
pub async fn list_books_by_genre(pool: &SqlitePool, genre: &str) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(
        r#"
        SELECT b.id, b.title, b.author, b.genres, b.status, b.start_date, b.end_date,
               b.rating, b.notes, b.description, b.cover_url, b.page_count,
               b.date_added, b.is_recommendation
        FROM BookGenres g
        JOIN Books b ON b.id = g.book_id
        WHERE g.genre = ?
        "#,
    )
    .bind(genre)
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("filter_by_genre", e))?;

    collect_books(rows)
}

/// Case-insensitive substring search over title and author
///
/// Scans the whole table; SQLite indexes can't serve infix matches. An empty
/// query matches nothing.
pub async fn search_books(pool: &SqlitePool, query: &str) -> Result<Vec<Book>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let needle = query.to_lowercase();

    let sql = format!("{SELECT_BOOKS} ORDER BY rowid");
    let mut rows = sqlx::query_as::<_, BookRow>(&sql).fetch(pool);

    let mut matches = Vec::new();
    while let Some(row) = rows
        .try_next()
        .await
        .map_err(|e| storage_failure("search", e))?
    {
        if row.title.to_lowercase().contains(&needle) || row.author.to_lowercase().contains(&needle)
        {
            matches.push(Book::try_from(row)?);
        }
    }

    Ok(matches)
}

/// Count total books
pub async fn count_books(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Books")
        .fetch_one(pool)
        .await
        .map_err(|e| storage_failure("count", e))?;

    Ok(count)
}

/// Count books per status; every status is present
pub async fn count_books_by_status(pool: &SqlitePool) -> Result<BTreeMap<ReadingStatus, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM Books INDEXED BY idx_books_status GROUP BY status",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("count_by_status", e))?;

    let mut counts: BTreeMap<ReadingStatus, i64> =
        ReadingStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for (status, count) in rows {
        if let Some(status) = ReadingStatus::parse(&status) {
            counts.insert(status, count);
        }
    }
    Ok(counts)
}

/// Most recently added books first
pub async fn list_recently_added(pool: &SqlitePool, limit: i64) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "{SELECT_BOOKS} ORDER BY date_added DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("recently_added", e))?;

    collect_books(rows)
}

/// Books with an end date, most recently finished first
pub async fn list_recently_finished(pool: &SqlitePool, limit: i64) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "{SELECT_BOOKS} WHERE end_date IS NOT NULL ORDER BY end_date DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("recently_finished", e))?;

    collect_books(rows)
}

/// Books rated at least `min_rating`, best first
pub async fn list_top_rated(pool: &SqlitePool, min_rating: u8) -> Result<Vec<Book>> {
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "{SELECT_BOOKS} WHERE rating >= ? ORDER BY rating DESC, title"
    ))
    .bind(min_rating)
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("top_rated", e))?;

    collect_books(rows)
}

/// Distinct genres with how many books hold them, most common first
pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let genres: Vec<(String, i64)> = sqlx::query_as(
        "SELECT genre, COUNT(*) AS books FROM BookGenres GROUP BY genre ORDER BY books DESC, genre",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| storage_failure("genres", e))?;

    Ok(genres)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn is_unique_violation(err: &sqlx::Error) -> bool {
    // SQLITE_CONSTRAINT_PRIMARYKEY (1555) / SQLITE_CONSTRAINT_UNIQUE (2067)
    err.as_database_error()
        .map(|db_err| {
            db_err.is_unique_violation()
                || matches!(db_err.code().as_deref(), Some("1555") | Some("2067"))
        })
        .unwrap_or(false)
}

fn storage_failure(operation: &str, err: sqlx::Error) -> StoreError {
    log::error!("Book store {} failed: {}", operation, err);
    StoreError::from(err).during(operation)
}
