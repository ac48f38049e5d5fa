//! Reading statistics
//!
//! Aggregates are computed in memory from store reads; the store itself keeps
//! no counters.

use crate::error::Result;
use crate::storage::{Book, BookStore, ReadingStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How many genres/authors the analysis keeps
pub const TOP_N: usize = 5;

/// Most-read genres and authors, as `(name, count)` pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistory {
    pub top_genres: Vec<(String, usize)>,
    pub top_authors: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub top_genres: Vec<(String, usize)>,
    pub top_authors: Vec<(String, usize)>,
    pub total_read: usize,
    /// Mean of valid ratings on read books, one decimal; `None` when unrated
    pub average_rating: Option<f64>,
    /// Read books per rating, index 0 is one star
    pub rating_distribution: [usize; 5],
    pub by_status: BTreeMap<ReadingStatus, i64>,
}

/// Count genres and authors over read books
///
/// Names are trimmed and lower-cased before counting. Ties are broken
/// alphabetically so the result is stable.
pub fn analyze_reading_history(read_books: &[Book]) -> ReadingHistory {
    let mut genre_counts: HashMap<String, usize> = HashMap::new();
    let mut author_counts: HashMap<String, usize> = HashMap::new();

    for book in read_books {
        for genre in &book.genres {
            let g = genre.trim().to_lowercase();
            if !g.is_empty() {
                *genre_counts.entry(g).or_default() += 1;
            }
        }
        let a = book.author.trim().to_lowercase();
        if !a.is_empty() {
            *author_counts.entry(a).or_default() += 1;
        }
    }

    ReadingHistory {
        top_genres: top_n(genre_counts),
        top_authors: top_n(author_counts),
    }
}

fn top_n(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|(name_a, count_a), (name_b, count_b)| {
        count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
    });
    entries.truncate(TOP_N);
    entries
}

/// Statistics over a set of books
pub fn summarize(books: &[Book], by_status: BTreeMap<ReadingStatus, i64>) -> ReadingStats {
    let read_books: Vec<Book> = books
        .iter()
        .filter(|b| b.status == ReadingStatus::Read)
        .cloned()
        .collect();
    let history = analyze_reading_history(&read_books);

    let mut rating_distribution = [0usize; 5];
    let mut total_rating = 0u32;
    let mut rated = 0u32;
    for rating in read_books.iter().filter_map(|b| b.rating) {
        if (1..=5).contains(&rating) {
            rating_distribution[rating as usize - 1] += 1;
            total_rating += rating as u32;
            rated += 1;
        }
    }

    let average_rating = if rated > 0 {
        let mean = total_rating as f64 / rated as f64;
        Some((mean * 10.0).round() / 10.0)
    } else {
        None
    };

    ReadingStats {
        top_genres: history.top_genres,
        top_authors: history.top_authors,
        total_read: read_books.len(),
        average_rating,
        rating_distribution,
        by_status,
    }
}

/// Reading-history analysis straight from the store
pub async fn reading_history(store: &BookStore) -> Result<ReadingHistory> {
    let read_books = store.get_by_status(ReadingStatus::Read).await?;
    Ok(analyze_reading_history(&read_books))
}

/// Full statistics straight from the store
pub async fn calculate_stats(store: &BookStore) -> Result<ReadingStats> {
    let books = store.get_all().await?;
    let by_status = store.count_by_status().await?;
    let stats = summarize(&books, by_status);
    log::debug!(
        "Calculated stats: {} read, average rating {:?}",
        stats.total_read,
        stats.average_rating
    );
    Ok(stats)
}
