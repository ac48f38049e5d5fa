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


//! Book store handle
//!
//! [`BookStore`] is the contract the UI and recommendation layers talk to.
//! It is an owned value: open it once and hand clones to whoever needs
//! persistence. [`StoreConnector`] makes opening idempotent, so concurrent
//! callers racing to initialise share a single open.

use crate::error::Result;
use crate::storage::config::StoreConfig;
use crate::storage::database::Database;
use crate::storage::models::{Book, ReadingStatus};
use crate::storage::queries;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

/// Open book store
///
/// Cloning is cheap and every clone shares the same connection pool.
#[derive(Debug, Clone)]
pub struct BookStore {
    db: Database,
}

impl BookStore {
    /// Open (and migrate) the store described by `config`
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let db = Database::open(config).await?;
        Ok(Self { db })
    }

    /// Private in-memory store, mostly for tests
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory()).await
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Underlying database, for maintenance operations
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert a new record; fails with `DuplicateKey` if its id exists
    pub async fn insert(&self, book: &Book) -> Result<String> {
        queries::insert_book(self.db.pool(), book).await
    }

    /// Fetch a record, `None` when the id isn't stored
    pub async fn get(&self, id: &str) -> Result<Option<Book>> {
        queries::find_book_by_id(self.db.pool(), id).await
    }

    pub async fn get_all(&self) -> Result<Vec<Book>> {
        queries::list_books(self.db.pool()).await
    }

    pub async fn get_by_status(&self, status: ReadingStatus) -> Result<Vec<Book>> {
        queries::list_books_by_status(self.db.pool(), status).await
    }

    /// Status lookup from its wire name; unknown names match nothing
    pub async fn get_by_status_name(&self, status: &str) -> Result<Vec<Book>> {
        match ReadingStatus::parse(status) {
            Some(status) => self.get_by_status(status).await,
            None => Ok(Vec::new()),
        }
    }

    /// Records whose genres contain exactly `genre` (no normalization)
    pub async fn filter_by_genre(&self, genre: &str) -> Result<Vec<Book>> {
        queries::list_books_by_genre(self.db.pool(), genre).await
    }

    /// Case-insensitive title/author substring search; `""` matches nothing
    pub async fn search(&self, query: &str) -> Result<Vec<Book>> {
        queries::search_books(self.db.pool(), query).await
    }

    /// Whole-record replace keyed by id; fails with `MissingKey` without one
    pub async fn update(&self, book: &Book) -> Result<String> {
        queries::update_book(self.db.pool(), book).await
    }

    /// Remove a record; deleting an unknown id succeeds
    pub async fn delete(&self, id: &str) -> Result<()> {
        queries::delete_book(self.db.pool(), id).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        queries::count_books(self.db.pool()).await
    }

    pub async fn count_by_status(&self) -> Result<BTreeMap<ReadingStatus, i64>> {
        queries::count_books_by_status(self.db.pool()).await
    }

    pub async fn recently_added(&self, limit: i64) -> Result<Vec<Book>> {
        queries::list_recently_added(self.db.pool(), limit).await
    }

    pub async fn recently_finished(&self, limit: i64) -> Result<Vec<Book>> {
        queries::list_recently_finished(self.db.pool(), limit).await
    }

    pub async fn top_rated(&self, min_rating: u8) -> Result<Vec<Book>> {
        queries::list_top_rated(self.db.pool(), min_rating).await
    }

    /// Distinct genres with record counts, most common first
    pub async fn genres(&self) -> Result<Vec<(String, i64)>> {
        queries::list_genres(self.db.pool()).await
    }

    pub async fn schema_version(&self) -> Result<i64> {
        self.db.schema_version().await
    }

    /// Release the connection pool
    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Idempotent opener for a [`BookStore`]
///
/// The first `connect` opens and migrates; every later or concurrent call
/// gets a clone of the same store. A failed open leaves nothing cached, so
/// the next call tries again.
///
/// Closing a handed-out [`BookStore`] directly closes the cached one too,
/// since they share a pool. Use [`StoreConnector::close`] instead so the
/// connector forgets it and the next `connect` opens a fresh store.
#[derive(Debug)]
pub struct StoreConnector {
    config: StoreConfig,
    store: OnceCell<BookStore>,
}

impl StoreConnector {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<BookStore> {
        let store = self
            .store
            .get_or_try_init(|| async {
                log::info!("Initializing book store...");
                BookStore::open(&self.config).await
            })
            .await?;

        Ok(store.clone())
    }

    /// Whether a store has been opened
    pub fn is_connected(&self) -> bool {
        self.store.get().is_some()
    }

    /// Close the cached store, if any, and forget it
    ///
    /// Clones handed out earlier stop working; a later `connect` reopens.
    pub async fn close(&mut self) {
        if let Some(store) = self.store.take() {
            store.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn sorted_ids(books: &[Book]) -> Vec<String> {
        let mut ids: Vec<String> = books.iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_status_workflow() {
        let store = BookStore::open_in_memory().await.unwrap();

        let a = Book::new("1984", "George Orwell");
        let b = Book::new("Dune", "Frank Herbert").with_status(ReadingStatus::Reading);
        let mut c = Book::new("Emma", "Jane Austen").with_status(ReadingStatus::Read);
        c.rating = Some(5);

        for book in [&a, &b, &c] {
            store.insert(book).await.unwrap();
        }

        assert_eq!(
            sorted_ids(&store.get_by_status(ReadingStatus::Reading).await.unwrap()),
            vec![b.id.clone()]
        );

        let mut finished = b.clone();
        finished.status = ReadingStatus::Read;
        finished.end_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        store.update(&finished).await.unwrap();

        let mut expected = vec![b.id.clone(), c.id.clone()];
        expected.sort();
        assert_eq!(
            sorted_ids(&store.get_by_status(ReadingStatus::Read).await.unwrap()),
            expected
        );
        assert!(store
            .get_by_status(ReadingStatus::Reading)
            .await
            .unwrap()
            .is_empty());

        store.delete(&a.id).await.unwrap();
        store.delete(&a.id).await.unwrap();
        assert!(store.get(&a.id).await.unwrap().is_none());
        assert_eq!(sorted_ids(&store.get_all().await.unwrap()), expected);
    }

    #[tokio::test]
    async fn test_connector_reopens_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut connector = StoreConnector::new(StoreConfig::at(dir.path().join("library.db")));

        let first = connector.connect().await.unwrap();
        let dune = Book::new("Dune", "Frank Herbert");
        first.insert(&dune).await.unwrap();

        connector.close().await;
        assert!(!connector.is_connected());
        assert!(first.database().is_closed());
        match first.get(&dune.id).await {
            Err(StoreError::StorageFailure { .. }) => {}
            other => panic!("closed handle should fail, got {other:?}"),
        }

        let second = connector.connect().await.unwrap();
        assert!(connector.is_connected());
        assert_eq!(second.get(&dune.id).await.unwrap(), Some(dune));
    }

    #[tokio::test]
    async fn test_unknown_status_name_is_empty() {
        let store = BookStore::open_in_memory().await.unwrap();
        store.insert(&Book::new("Dune", "Frank Herbert")).await.unwrap();

        assert!(store.get_by_status_name("finished").await.unwrap().is_empty());
        assert_eq!(store.get_by_status_name("to-read").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dune_search_scenario() {
        let store = BookStore::open_in_memory().await.unwrap();
        let mut dune = Book::new("Dune", "Frank Herbert");
        dune.id = "x".to_string();
        dune.genres = vec!["science fiction".to_string()];
        store.insert(&dune).await.unwrap();

        assert!(store.search("dune").await.unwrap().iter().any(|b| b.id == "x"));
        assert!(store.search("herbert").await.unwrap().iter().any(|b| b.id == "x"));
        assert!(store.search("hobbit").await.unwrap().is_empty());
        assert!(store.search("").await.unwrap().is_empty());
        assert_eq!(store.filter_by_genre("science fiction").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connector_is_idempotent() {
        let connector = Arc::new(StoreConnector::new(StoreConfig::in_memory()));
        assert!(!connector.is_connected());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let connector = Arc::clone(&connector);
            handles.push(tokio::spawn(async move { connector.connect().await }));
        }
        let mut stores = Vec::new();
        for handle in handles {
            stores.push(handle.await.unwrap().unwrap());
        }

        // Each in-memory open is a separate database, so a write through one
        // handle is only visible through the others if they share one open
        let book = Book::new("Foundation", "Isaac Asimov");
        stores[0].insert(&book).await.unwrap();
        for store in &stores {
            assert_eq!(store.count().await.unwrap(), 1);
        }
        let again = connector.connect().await.unwrap();
        assert!(again.get(&book.id).await.unwrap().is_some());
        assert!(connector.is_connected());
    }

    #[tokio::test]
    async fn test_connector_failure_leaves_no_handle() {
        let dir = tempfile::tempdir().unwrap();
        let connector = StoreConnector::new(StoreConfig::at(dir.path()));

        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::StorageFailure { .. }));
        assert!(!connector.is_connected());
    }
}
