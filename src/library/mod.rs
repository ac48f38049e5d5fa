//! Library features built on the book store
//!
//! Everything here goes through the [`BookStore`](crate::storage::BookStore)
//! contract: status changes with date bookkeeping, reading statistics, and
//! first-launch sample data.

pub mod sample;
pub mod stats;
pub mod status;

pub use sample::{sample_books, seed_if_empty};
pub use stats::{analyze_reading_history, calculate_stats, ReadingHistory, ReadingStats};
pub use status::{apply_status_change, change_status};
