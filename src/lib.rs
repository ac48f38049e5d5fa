//! Bookshelf core
//!
//! Local persistent store for a personal library tracker. The [`storage`]
//! module owns the SQLite-backed book store; [`library`] builds status
//! changes, statistics and sample data on top of it.

pub mod error;
pub mod library;
pub mod storage;

pub use error::{Result, StoreError};
pub use storage::{Book, BookStore, ReadingStatus, StoreConfig, StoreConnector};
