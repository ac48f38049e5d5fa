//! Error types for Bookshelf
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Every failure that reaches a caller of the book store is one of a small set
//! of conditions, so the UI layer can branch on them without knowing anything
//! about SQLite.
//!
//! ## Conditions
//! - `DuplicateKey` - insert with an id that is already stored
//! - `MissingKey` - insert/update called on a record without an id
//! - `StorageFailure` - engine-level failure (I/O, quota, corruption, failed
//!   open, schema step refused or failed)
//!
//! A missing record is not an error: lookups return `Option::None`.

use thiserror::Error;

/// Result type alias using our StoreError type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for Bookshelf
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== Contract Errors =====

    /// A record with this id already exists
    #[error("Duplicate key: a book with id '{0}' already exists")]
    DuplicateKey(String),

    /// The record carries no id
    #[error("Missing key: book record has no id")]
    MissingKey,

    // ===== Storage Errors =====

    /// Underlying storage engine failed
    #[error("Storage failure during {operation}: {message}")]
    StorageFailure {
        /// Store operation that failed (e.g. "insert", "open")
        operation: String,
        message: String,
    },

    /// Stored data could not be decoded or encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== Caller Errors =====

    /// Caller-side validation rejected the input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Serialization(format!("column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => StoreError::Serialization(source.to_string()),
            other => StoreError::storage("database", other),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::storage("io", err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// Helper methods for creating common errors
impl StoreError {
    /// Create a StorageFailure tagged with the store operation that failed
    pub fn storage<O: Into<String>, E: std::fmt::Display>(operation: O, err: E) -> Self {
        StoreError::StorageFailure {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        StoreError::InvalidInput(message.into())
    }

    /// Re-tag a StorageFailure with the operation it surfaced from
    ///
    /// Other variants pass through untouched.
    pub fn during(self, operation: &str) -> Self {
        match self {
            StoreError::StorageFailure { message, .. } => StoreError::StorageFailure {
                operation: operation.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Check if error originates in the storage engine rather than the call
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            StoreError::StorageFailure { .. } | StoreError::Serialization(_)
        )
    }

    /// Check if error was caused by the arguments of the call
    ///
    /// Retrying such a call unchanged will fail the same way.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateKey(_) | StoreError::MissingKey | StoreError::InvalidInput(_)
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            StoreError::DuplicateKey(_) => {
                "This book is already in your library.".to_string()
            }
            StoreError::MissingKey => {
                "The book could not be saved because it has no identifier.".to_string()
            }
            StoreError::StorageFailure { operation, .. } if operation == "open" => {
                "Could not open the library database. App features may be limited.".to_string()
            }
            StoreError::StorageFailure { operation, .. } if operation == "migrate" => {
                "The library database could not be upgraded.".to_string()
            }
            StoreError::StorageFailure { .. } | StoreError::Serialization(_) => {
                "Error saving to your library. Please try again.".to_string()
            }
            StoreError::InvalidInput(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_helper_keeps_operation() {
        let err = StoreError::storage("insert", "disk I/O error");
        assert_eq!(
            err.to_string(),
            "Storage failure during insert: disk I/O error"
        );
        assert!(err.is_storage_failure());
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_during_retags_storage_failures_only() {
        let err = StoreError::storage("database", "locked").during("update");
        match err {
            StoreError::StorageFailure { operation, .. } => assert_eq!(operation, "update"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = StoreError::MissingKey.during("update");
        assert!(matches!(err, StoreError::MissingKey));
    }

    #[test]
    fn test_sqlx_errors_never_leak_raw() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::StorageFailure { .. }));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            StoreError::DuplicateKey("x".into()).user_message(),
            "This book is already in your library."
        );
        assert!(StoreError::storage("open", "refused")
            .user_message()
            .contains("Could not open"));
        assert!(StoreError::storage("migrate", "schema version 9 is newer")
            .user_message()
            .contains("could not be upgraded"));
        assert_eq!(
            StoreError::invalid_input("Title and Author are required.").user_message(),
            "Title and Author are required."
        );
    }
}
