//! Status transitions
//!
//! Moving a book between lists is an update of its `status` field plus some
//! date bookkeeping. The store has no compare-and-swap, so two concurrent
//! changes to the same book resolve as last write wins.

use crate::error::Result;
use crate::storage::{Book, BookStore, ReadingStatus};
use chrono::{Local, NaiveDate};

/// Move `book` to `new_status`, adjusting its dates
///
/// - to `read`: end date (and start date, when missing) become `today`
/// - to `reading`: a missing start date becomes `today` and the end date is cleared
/// - to `to-read`: the end date is cleared, the start date kept
///
/// Returns `false` and leaves the book untouched when it already has the status.
pub fn apply_status_change(book: &mut Book, new_status: ReadingStatus, today: NaiveDate) -> bool {
    if book.status == new_status {
        return false;
    }

    book.status = new_status;
    match new_status {
        ReadingStatus::Read => {
            if book.end_date.is_none() {
                book.end_date = Some(today);
                if book.start_date.is_none() {
                    book.start_date = Some(today);
                }
            }
        }
        ReadingStatus::Reading => {
            if book.start_date.is_none() {
                book.start_date = Some(today);
                book.end_date = None;
            }
        }
        ReadingStatus::ToRead => {
            book.end_date = None;
        }
    }

    true
}

/// Change the status of a stored book, using today's local date
///
/// Returns the stored record, or `None` if `id` doesn't exist.
pub async fn change_status(
    store: &BookStore,
    id: &str,
    new_status: ReadingStatus,
) -> Result<Option<Book>> {
    change_status_on(store, id, new_status, Local::now().date_naive()).await
}

pub async fn change_status_on(
    store: &BookStore,
    id: &str,
    new_status: ReadingStatus,
    today: NaiveDate,
) -> Result<Option<Book>> {
    let Some(mut book) = store.get(id).await? else {
        log::warn!("Book {} not found for status change", id);
        return Ok(None);
    };

    if apply_status_change(&mut book, new_status, today) {
        store.update(&book).await?;
        log::info!("Book {} status updated to {}", id, new_status);
    } else {
        log::debug!("Book {} is already {}", id, new_status);
    }

    Ok(Some(book))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_finishing_sets_both_dates() {
        let mut book = Book::new("Dune", "Frank Herbert");
        assert!(apply_status_change(&mut book, ReadingStatus::Read, day(5, 1)));
        assert_eq!(book.start_date, Some(day(5, 1)));
        assert_eq!(book.end_date, Some(day(5, 1)));
    }

    #[test]
    fn test_finishing_keeps_existing_start() {
        let mut book = Book::new("Dune", "Frank Herbert").with_status(ReadingStatus::Reading);
        book.start_date = Some(day(3, 15));
        apply_status_change(&mut book, ReadingStatus::Read, day(5, 1));
        assert_eq!(book.start_date, Some(day(3, 15)));
        assert_eq!(book.end_date, Some(day(5, 1)));
    }

    #[test]
    fn test_start_reading_clears_end_date() {
        let mut book = Book::new("Emma", "Jane Austen");
        book.end_date = Some(day(1, 1));
        apply_status_change(&mut book, ReadingStatus::Reading, day(2, 2));
        assert_eq!(book.start_date, Some(day(2, 2)));
        assert_eq!(book.end_date, None);
    }

    #[test]
    fn test_back_to_to_read_keeps_start() {
        let mut book = Book::new("Emma", "Jane Austen").with_status(ReadingStatus::Read);
        book.start_date = Some(day(1, 1));
        book.end_date = Some(day(1, 9));
        apply_status_change(&mut book, ReadingStatus::ToRead, day(2, 2));
        assert_eq!(book.start_date, Some(day(1, 1)));
        assert_eq!(book.end_date, None);
    }

    #[test]
    fn test_same_status_is_noop() {
        let mut book = Book::new("Emma", "Jane Austen");
        let before = book.clone();
        assert!(!apply_status_change(&mut book, ReadingStatus::ToRead, day(2, 2)));
        assert_eq!(book, before);
    }

    #[tokio::test]
    async fn test_change_status_persists() {
        let store = BookStore::open_in_memory().await.unwrap();
        let book = Book::new("Dune", "Frank Herbert");
        store.insert(&book).await.unwrap();

        let updated = change_status_on(&store, &book.id, ReadingStatus::Reading, day(3, 15))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.start_date, Some(day(3, 15)));
        assert_eq!(store.get(&book.id).await.unwrap(), Some(updated));

        assert!(change_status(&store, "missing", ReadingStatus::Read)
            .await
            .unwrap()
            .is_none());
    }
}
