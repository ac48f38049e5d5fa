//! Sample library for first launch

use crate::error::Result;
use crate::storage::{Book, BookStore, ReadingStatus};
use chrono::NaiveDate;

struct SampleBook {
    title: &'static str,
    author: &'static str,
    genres: &'static [&'static str],
    status: ReadingStatus,
    rating: Option<u8>,
    dates: Option<(&'static str, Option<&'static str>)>,
}

const SAMPLES: &[SampleBook] = &[
    SampleBook {
        title: "The Hobbit",
        author: "J.R.R. Tolkien",
        genres: &["fantasy", "adventure"],
        status: ReadingStatus::Read,
        rating: Some(5),
        dates: Some(("2024-01-10", Some("2024-01-25"))),
    },
    SampleBook {
        title: "Dune",
        author: "Frank Herbert",
        genres: &["science fiction", "epic"],
        status: ReadingStatus::Reading,
        rating: None,
        dates: Some(("2024-03-15", None)),
    },
    SampleBook {
        title: "Pride and Prejudice",
        author: "Jane Austen",
        genres: &["romance", "classic"],
        status: ReadingStatus::Read,
        rating: Some(4),
        dates: Some(("2024-02-01", Some("2024-02-15"))),
    },
    SampleBook {
        title: "1984",
        author: "George Orwell",
        genres: &["dystopian", "science fiction"],
        status: ReadingStatus::ToRead,
        rating: None,
        dates: None,
    },
    SampleBook {
        title: "Foundation",
        author: "Isaac Asimov",
        genres: &["science fiction", "classic"],
        status: ReadingStatus::ToRead,
        rating: None,
        dates: None,
    },
    SampleBook {
        title: "To Kill a Mockingbird",
        author: "Harper Lee",
        genres: &["classic", "fiction"],
        status: ReadingStatus::Read,
        rating: Some(5),
        dates: Some(("2023-11-05", Some("2023-11-20"))),
    },
    SampleBook {
        title: "The Hitchhiker's Guide to the Galaxy",
        author: "Douglas Adams",
        genres: &["science fiction", "comedy", "adventure"],
        status: ReadingStatus::Reading,
        rating: None,
        dates: Some(("2024-04-01", None)),
    },
    SampleBook {
        title: "Neuromancer",
        author: "William Gibson",
        genres: &["science fiction", "cyberpunk"],
        status: ReadingStatus::ToRead,
        rating: None,
        dates: None,
    },
    SampleBook {
        title: "Emma",
        author: "Jane Austen",
        genres: &["romance", "classic"],
        status: ReadingStatus::ToRead,
        rating: None,
        dates: None,
    },
];

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// The sample books, each with a fresh id
pub fn sample_books() -> Vec<Book> {
    SAMPLES
        .iter()
        .map(|sample| {
            let mut book = Book::new(sample.title, sample.author).with_status(sample.status);
            book.genres = sample.genres.iter().map(|g| g.to_string()).collect();
            book.rating = sample.rating;
            if let Some((start, end)) = sample.dates {
                book.start_date = parse_date(start);
                book.end_date = end.and_then(parse_date);
            }
            book
        })
        .collect()
}

/// Populate an empty store with the sample books
///
/// Returns how many books were inserted; 0 when the store already has data.
pub async fn seed_if_empty(store: &BookStore) -> Result<usize> {
    if store.count().await? > 0 {
        log::info!("Library already contains data, skipping sample data");
        return Ok(0);
    }

    let books = sample_books();
    for book in &books {
        store.insert(book).await?;
    }
    log::info!("Sample data populated: {} books", books.len());
    Ok(books.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_books_are_valid() {
        let books = sample_books();
        assert_eq!(books.len(), SAMPLES.len());
        for book in &books {
            book.validate().expect("sample book should be valid");
        }
    }

    #[tokio::test]
    async fn test_seed_only_once() {
        let store = BookStore::open_in_memory().await.unwrap();

        assert_eq!(seed_if_empty(&store).await.unwrap(), SAMPLES.len());
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), SAMPLES.len() as i64);

        let reading = store.get_by_status(ReadingStatus::Reading).await.unwrap();
        assert_eq!(reading.len(), 2);
        assert_eq!(store.filter_by_genre("cyberpunk").await.unwrap().len(), 1);
    }
}
