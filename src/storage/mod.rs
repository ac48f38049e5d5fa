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


//! Database storage and models
//!
//! This module handles all database operations using SQLite through sqlx.
//!
//! # Database Schema
//! - Books: one row per book, keyed by a caller-generated id, with indexes on
//!   title, author, status, end_date, date_added and rating
//! - BookGenres: inverted genre -> book id table (multi-value genre index)
//! - _migrations: applied schema versions
//!
//! # Usage Example
//! ```no_run
//! use bookshelf_core::storage::{Book, ReadingStatus, StoreConfig, StoreConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = StoreConnector::new(StoreConfig::at("./my_library.db"));
//! let store = connector.connect().await?;
//!
//! let dune = Book::new("Dune", "Frank Herbert").with_genres_input("Science Fiction, Epic");
//! let id = store.insert(&dune).await?;
//!
//! let to_read = store.get_by_status(ReadingStatus::ToRead).await?;
//! let found = store.search("herbert").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

// Re-export commonly used types
pub use config::StoreConfig;
pub use database::{Database, DatabaseStats};
pub use migrations::SCHEMA_VERSION;
pub use models::{normalize_genres, Book, ReadingStatus};
pub use store::{BookStore, StoreConnector};
