//! Integration tests for the on-disk book store
//!
//! Each test opens a store in a fresh temp directory, closes it and opens it
//! again, the way the app does across restarts.

use bookshelf_core::library;
use bookshelf_core::storage::{Book, BookStore, ReadingStatus, StoreConfig, StoreConnector};
use bookshelf_core::StoreError;
use chrono::NaiveDate;

fn sorted_ids(books: &[Book]) -> Vec<String> {
    let mut ids: Vec<String> = books.iter().map(|b| b.id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_reopen_preserves_state() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let config = StoreConfig::at(temp_dir.path().join("library.db"));

    let kept = Book::new("The Hobbit", "J.R.R. Tolkien").with_genres_input("Fantasy, Adventure");
    let mut changed = Book::new("Dune", "Frank Herbert").with_genres_input("science fiction");
    changed.notes = Some("Spice must flow".to_string());
    let removed = Book::new("1984", "George Orwell");

    {
        let store = BookStore::open(&config).await?;
        store.insert(&kept).await?;
        store.insert(&changed).await?;
        store.insert(&removed).await?;

        changed.status = ReadingStatus::Read;
        changed.rating = Some(5);
        changed.end_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        changed.genres = vec!["classic".to_string()];
        store.update(&changed).await?;
        store.delete(&removed.id).await?;
        store.close().await;
    }

    let store = BookStore::open(&config).await?;
    assert_eq!(store.get(&kept.id).await?, Some(kept.clone()));
    assert_eq!(store.get(&changed.id).await?, Some(changed.clone()));
    assert_eq!(store.get(&removed.id).await?, None);
    assert_eq!(store.count().await?, 2);

    // Indexes survive the restart too
    assert_eq!(
        sorted_ids(&store.get_by_status(ReadingStatus::Read).await?),
        vec![changed.id.clone()]
    );
    assert_eq!(sorted_ids(&store.filter_by_genre("fantasy").await?), vec![kept.id.clone()]);
    assert!(store.filter_by_genre("science fiction").await?.is_empty());
    assert_eq!(store.schema_version().await?, bookshelf_core::storage::SCHEMA_VERSION);
    assert!(store.database().check_integrity().await?);

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_insert_survives_restart() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let config = StoreConfig::at(temp_dir.path().join("library.db"));

    let original = Book::new("Emma", "Jane Austen");
    {
        let store = BookStore::open(&config).await?;
        store.insert(&original).await?;
        store.close().await;
    }

    let store = BookStore::open(&config).await?;
    let mut clash = original.clone();
    clash.title = "Persuasion".to_string();
    let err = store.insert(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
    assert_eq!(store.get(&original.id).await?, Some(original));

    store.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_and_readers() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let connector = std::sync::Arc::new(StoreConnector::new(StoreConfig::at(
        temp_dir.path().join("library.db"),
    )));

    let mut handles = Vec::new();
    for i in 0..16 {
        let connector = std::sync::Arc::clone(&connector);
        handles.push(tokio::spawn(async move {
            let store = connector.connect().await?;
            let mut book = Book::new(format!("Book {i}"), format!("Author {i}"));
            book.genres = vec!["shared".to_string(), format!("genre-{i}")];
            store.insert(&book).await?;

            // Whatever a reader sees, the row and its genre entries agree
            let shared = store.filter_by_genre("shared").await?;
            for seen in &shared {
                assert!(seen.genres.contains(&"shared".to_string()));
                assert!(store.get(&seen.id).await?.is_some());
            }
            Ok::<_, StoreError>(book.id)
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.sort();

    let store = connector.connect().await?;
    assert_eq!(sorted_ids(&store.filter_by_genre("shared").await?), ids);
    assert_eq!(store.count().await?, 16);

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn test_seed_and_stats_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let config = StoreConfig::at(temp_dir.path().join("library.db"));

    {
        let store = BookStore::open(&config).await?;
        assert_eq!(library::seed_if_empty(&store).await?, 9);
        store.close().await;
    }

    let store = BookStore::open(&config).await?;
    assert_eq!(library::seed_if_empty(&store).await?, 0);

    let stats = library::calculate_stats(&store).await?;
    assert_eq!(stats.total_read, 3);
    assert_eq!(stats.average_rating, Some(4.7));
    assert_eq!(stats.rating_distribution, [0, 0, 0, 1, 2]);
    assert_eq!(stats.top_genres[0], ("classic".to_string(), 2));

    let finished = store.recently_finished(1).await?;
    assert_eq!(finished[0].title, "Pride and Prejudice");

    store.close().await;
    Ok(())
}
