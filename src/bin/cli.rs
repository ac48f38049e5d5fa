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

use anyhow::{bail, Context};
use bookshelf_core::library::{self, stats};
use bookshelf_core::storage::{Book, BookStore, ReadingStatus, StoreConfig, StoreConnector};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(about = "Bookshelf CLI - Desktop testing tool", long_about = None)]
struct Cli {
    /// Database file (defaults to BOOKSHELF_DB_PATH or the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON store config file
    #[arg(long, global = true, conflicts_with = "db")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book
    Add {
        title: String,
        author: String,
        /// Comma-separated genres
        #[arg(short, long, default_value = "")]
        genres: String,
        #[arg(short, long, default_value = "to-read")]
        status: ReadingStatus,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show one book as JSON
    Get { id: String },
    /// List books, optionally by status
    List {
        #[arg(short, long)]
        status: Option<ReadingStatus>,
    },
    /// List books holding a genre (exact match)
    Genre { genre: String },
    /// Search titles and authors
    Search { query: String },
    /// Move a book to another list
    Status { id: String, status: ReadingStatus },
    /// Rate a book 1-5
    Rate { id: String, rating: u8 },
    /// Delete a book
    Delete { id: String },
    /// Reading statistics
    Stats,
    /// Insert sample books into an empty library
    Seed,
    /// Write all books to a JSON file
    Export { file: PathBuf },
    /// Insert books from a JSON file (existing ids are replaced)
    Import { file: PathBuf },
    /// Database information
    Info,
    /// Give free pages back to the filesystem
    Vacuum {
        /// Rebuild the whole file instead of releasing free pages in place
        #[arg(long)]
        full: bool,
    },
    /// Refresh query planner statistics
    Optimize,
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in books {
        let rating = book
            .rating
            .map(|r| format!(" {}/5", r))
            .unwrap_or_default();
        println!(
            "{}  [{}] {} by {}{}",
            book.id, book.status, book.title, book.author, rating
        );
    }
}

async fn require(store: &BookStore, id: &str) -> anyhow::Result<Book> {
    match store.get(id).await? {
        Some(book) => Ok(book),
        None => bail!("Book {} not found", id),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match (&cli.db, &cli.config) {
        (Some(path), _) => StoreConfig::at(path),
        (None, Some(file)) => StoreConfig::from_json_file(file)?,
        (None, None) => StoreConfig::from_env(),
    };
    let mut connector = StoreConnector::new(config);
    let store = connector
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()).context(e.to_string()))?;

    match cli.command {
        Commands::Add {
            title,
            author,
            genres,
            status,
            notes,
        } => {
            let mut book = Book::new(title, author)
                .with_genres_input(&genres)
                .with_status(status);
            book.notes = notes;
            book.validate()?;
            let id = store.insert(&book).await?;
            println!("Added {}", id);
        }
        Commands::Get { id } => {
            let book = require(&store, &id).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        Commands::List { status } => {
            let books = match status {
                Some(status) => store.get_by_status(status).await?,
                None => store.get_all().await?,
            };
            print_books(&books);
        }
        Commands::Genre { genre } => {
            print_books(&store.filter_by_genre(&genre).await?);
        }
        Commands::Search { query } => {
            print_books(&store.search(&query).await?);
        }
        Commands::Status { id, status } => {
            match library::change_status(&store, &id, status).await? {
                Some(book) => println!("{} is now {}", book.title, book.status),
                None => bail!("Book {} not found", id),
            }
        }
        Commands::Rate { id, rating } => {
            let mut book = require(&store, &id).await?;
            book.rating = Some(rating);
            book.validate()?;
            store.update(&book).await?;
            println!("Rated {} {}/5", book.title, rating);
        }
        Commands::Delete { id } => {
            store.delete(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Stats => {
            let stats = stats::calculate_stats(&store).await?;
            println!("Total Books Read: {}", stats.total_read);
            match stats.average_rating {
                Some(avg) => println!("Average Rating: {:.1} / 5", avg),
                None => println!("Average Rating: N/A"),
            }
            let fmt_top = |entries: &[(String, usize)]| {
                if entries.is_empty() {
                    "N/A".to_string()
                } else {
                    entries
                        .iter()
                        .map(|(name, count)| format!("{} ({})", name, count))
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            };
            println!("Top Genres: {}", fmt_top(&stats.top_genres));
            println!("Top Authors: {}", fmt_top(&stats.top_authors));
            let distribution = stats
                .rating_distribution
                .iter()
                .enumerate()
                .map(|(i, count)| format!("{}*: {}", i + 1, count))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Rating Distribution: {}", distribution);
            for (status, count) in &stats.by_status {
                println!("{}: {}", status, count);
            }
        }
        Commands::Seed => {
            let inserted = library::seed_if_empty(&store).await?;
            println!("Inserted {} sample books", inserted);
        }
        Commands::Export { file } => {
            let books = store.get_all().await?;
            let json = serde_json::to_string_pretty(&books)?;
            tokio::fs::write(&file, json)
                .await
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Exported {} books to {}", books.len(), file.display());
        }
        Commands::Import { file } => {
            let data = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let books: Vec<Book> = serde_json::from_str(&data)?;
            for book in &books {
                store.update(book).await?;
            }
            println!("Imported {} books", books.len());
        }
        Commands::Info => {
            let db = store.database();
            let stats = db.stats().await?;
            println!(
                "Path: {}",
                db.path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ":memory:".to_string())
            );
            println!("Schema version: {}", store.schema_version().await?);
            println!("Books: {}", store.count().await?);
            println!(
                "Size: {} bytes ({:.1}% unused)",
                stats.total_size,
                stats.unused_percentage()
            );
            println!("Integrity: {}", if db.quick_check().await? { "ok" } else { "FAILED" });
            if stats.should_vacuum() {
                println!("Tip: run `bookshelf-cli vacuum` to reclaim unused space");
            }
        }
        Commands::Vacuum { full } => {
            let db = store.database();
            let before = db.stats().await?;
            if full {
                db.vacuum().await?;
            } else {
                db.incremental_vacuum(0).await?;
            }
            db.checkpoint().await?;
            let after = db.stats().await?;
            println!(
                "Size: {} -> {} bytes",
                before.total_size, after.total_size
            );
        }
        Commands::Optimize => {
            store.database().optimize().await?;
            println!("Query planner statistics refreshed");
        }
    }

    connector.close().await;
    Ok(())
}
