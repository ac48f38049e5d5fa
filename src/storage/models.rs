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


//! Database models for Bookshelf
//!
//! # SQLite Adaptations
//! - `genres` stored as a JSON array on the row (order preserved) and mirrored
//!   into the `BookGenres` table, which acts as the multi-value index
//! - `status` stored as its wire string (`to-read`, `reading`, `read`)
//! - Dates stored as TEXT (`YYYY-MM-DD`), timestamps as RFC 3339

use crate::error::{Result, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;

// ============================================================================
// ENUMS
// ============================================================================

/// Reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[serde(rename = "to-read")]
    ToRead,
    #[serde(rename = "reading")]
    Reading,
    #[serde(rename = "read")]
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Read,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to-read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Read => "read",
        }
    }

    /// Parse the stored/wire representation, `None` for anything else
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to-read" => Some(ReadingStatus::ToRead),
            "reading" => Some(ReadingStatus::Reading),
            "read" => Some(ReadingStatus::Read),
            _ => None,
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        ReadingStatus::parse(s)
            .ok_or_else(|| StoreError::invalid_input(format!("Invalid reading status: {}", s)))
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book record - the only entity in the store
///
/// The caller supplies the full record, including `id`. The store never
/// validates field shapes beyond id uniqueness; see [`Book::validate`] for the
/// rules the UI layer applies before saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Primary key, generated by the caller
    pub id: String,
    pub title: String,
    pub author: String,
    /// Normalized genre names, order preserved
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: ReadingStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Personal rating, 1-5
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,

    // Enrichment from external catalogs
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,

    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub is_recommendation: bool,
}

impl Book {
    /// New to-read book with a fresh v4 id
    pub fn new<T: Into<String>, A: Into<String>>(title: T, author: A) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            author: author.into(),
            genres: Vec::new(),
            status: ReadingStatus::ToRead,
            start_date: None,
            end_date: None,
            rating: None,
            notes: None,
            description: None,
            cover_url: None,
            page_count: None,
            date_added: Utc::now(),
            is_recommendation: false,
        }
    }

    /// Set genres from a comma-separated form value
    pub fn with_genres_input(mut self, input: &str) -> Self {
        self.genres = normalize_genres(input);
        self
    }

    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.status = status;
        self
    }

    /// Caller-side business rules applied before insert/update
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.author.trim().is_empty() {
            return Err(StoreError::invalid_input("Title and Author are required."));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(StoreError::invalid_input(format!(
                    "Rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(StoreError::invalid_input(format!(
                    "Start date {} is after end date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Whether the record carries a primary key
    ///
    /// Ids are opaque: only the empty string counts as missing.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Split a comma-separated genre list, trimming and lower-casing each entry
pub fn normalize_genres(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Raw `Books` row as stored by SQLite
#[derive(Debug, FromRow)]
pub(crate) struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genres: Json<Vec<String>>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub rating: Option<u8>,
    pub notes: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<u32>,
    pub date_added: DateTime<Utc>,
    pub is_recommendation: bool,
}

impl TryFrom<BookRow> for Book {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self> {
        let status = ReadingStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Serialization(format!(
                "book '{}' has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            genres: row.genres.0,
            status,
            start_date: row.start_date,
            end_date: row.end_date,
            rating: row.rating,
            notes: row.notes,
            description: row.description,
            cover_url: row.cover_url,
            page_count: row.page_count,
            date_added: row.date_added,
            is_recommendation: row.is_recommendation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in ReadingStatus::ALL {
            assert_eq!(ReadingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReadingStatus::parse("finished"), None);
        assert_eq!(
            serde_json::to_string(&ReadingStatus::ToRead).unwrap(),
            "\"to-read\""
        );
        assert!("READ".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_normalize_genres() {
        assert_eq!(
            normalize_genres(" Science Fiction, epic ,, ,Classic"),
            vec!["science fiction", "epic", "classic"]
        );
        assert!(normalize_genres("").is_empty());
    }

    #[test]
    fn test_new_book_defaults() {
        let book = Book::new("Dune", "Frank Herbert").with_genres_input("Science Fiction");
        assert!(book.has_id());
        assert_eq!(book.status, ReadingStatus::ToRead);
        assert_eq!(book.genres, vec!["science fiction"]);
        assert!(!book.is_recommendation);
        assert_ne!(book.id, Book::new("Dune", "Frank Herbert").id);
    }

    #[test]
    fn test_validate() {
        let mut book = Book::new("Emma", "Jane Austen");
        assert!(book.validate().is_ok());

        book.rating = Some(6);
        assert!(matches!(book.validate(), Err(StoreError::InvalidInput(_))));
        book.rating = Some(5);

        book.start_date = NaiveDate::from_ymd_opt(2024, 3, 2);
        book.end_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(book.validate().is_err());

        let untitled = Book::new("  ", "Jane Austen");
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let mut book = Book::new("Dune", "Frank Herbert");
        book.cover_url = Some("https://covers.example/dune.jpg".into());
        let value = serde_json::to_value(&book).unwrap();
        assert!(value.get("coverUrl").is_some());
        assert!(value.get("dateAdded").is_some());
        assert_eq!(value["isRecommendation"], serde_json::json!(false));

        let back: Book = serde_json::from_value(value).unwrap();
        assert_eq!(back, book);
    }
}
