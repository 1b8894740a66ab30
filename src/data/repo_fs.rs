//! Filesystem-backed repository reading the ratings and book CSV exports.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::config::AppCfg;
use crate::common::error::{BookrecError, BookrecResult};

use super::domain::{Book, Catalog, DataRepo, Isbn, Rating, RatingTable};

/// Raw ratings row. Accepts both the original export headers and their
/// normalised names.
#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "User-ID", alias = "user_id")]
    user: u64,
    #[serde(rename = "ISBN")]
    isbn: String,
    #[serde(rename = "Book-Rating", alias = "rating")]
    rating: f64,
}

/// Raw metadata row. Columns outside this set (index, user_id, rating...)
/// are ignored.
#[derive(Debug, Deserialize)]
struct BookRow {
    #[serde(rename = "ISBN")]
    isbn: String,
    title: String,
    author: String,
    year: String,
    average_rating: f64,
    count_ratings: f64,
    #[serde(default)]
    image: String,
}

const RATING_COLUMNS: &[&[&str]] = &[
    &["User-ID", "user_id"],
    &["ISBN"],
    &["Book-Rating", "rating"],
];

const BOOK_COLUMNS: &[&[&str]] = &[
    &["ISBN"],
    &["title"],
    &["author"],
    &["year"],
    &["average_rating"],
    &["count_ratings"],
];

/// Filesystem repository for the two CSV tables.
pub struct FsDataRepo {
    ratings: PathBuf,
    books: PathBuf,
}

impl FsDataRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::with_paths(cfg.ratings_path(), cfg.books_path())
    }

    pub fn with_paths(ratings: impl Into<PathBuf>, books: impl Into<PathBuf>) -> Self {
        Self {
            ratings: ratings.into(),
            books: books.into(),
        }
    }
}

fn open(path: &Path, required: &[&[&str]]) -> BookrecResult<csv::Reader<std::fs::File>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    for choices in required {
        if !choices.iter().any(|c| headers.iter().any(|h| h == *c)) {
            return Err(BookrecError::MissingColumn {
                path: path.to_path_buf(),
                column: choices[0].to_string(),
            });
        }
    }
    Ok(reader)
}

fn csv_error(path: &Path, source: csv::Error) -> BookrecError {
    if source.is_io_error() {
        return BookrecError::io(path, source.into());
    }
    BookrecError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

impl DataRepo for FsDataRepo {
    fn load_ratings(&self) -> BookrecResult<RatingTable> {
        let mut reader = open(&self.ratings, RATING_COLUMNS)?;
        let mut rows = Vec::new();
        let mut zeros = 0usize;
        for record in reader.deserialize::<RatingRow>() {
            let row = record.map_err(|source| csv_error(&self.ratings, source))?;
            if row.rating == 0.0 {
                zeros += 1;
                continue;
            }
            rows.push(Rating::new(row.user, Isbn::new(row.isbn), row.rating));
        }
        let table = RatingTable::new(rows);
        log::info!(
            "loaded {} ratings from {} ({} implicit zero ratings dropped)",
            table.len(),
            self.ratings.display(),
            zeros
        );
        let dupes = table.duplicate_pairs();
        if dupes > 0 {
            log::warn!("{dupes} ratings repeat an earlier (user, book) pair");
        }
        Ok(table)
    }

    fn load_catalog(&self) -> BookrecResult<Catalog> {
        let mut reader = open(&self.books, BOOK_COLUMNS)?;
        let mut books = Vec::new();
        for record in reader.deserialize::<BookRow>() {
            let row = record.map_err(|source| csv_error(&self.books, source))?;
            if !(row.count_ratings.is_finite() && row.count_ratings >= 0.0) {
                return Err(BookrecError::invalid(format!(
                    "book {}: count_ratings `{}` is not a count",
                    row.isbn, row.count_ratings
                )));
            }
            if !row.average_rating.is_finite() {
                return Err(BookrecError::invalid(format!(
                    "book {}: average_rating `{}` is not a rating",
                    row.isbn, row.average_rating
                )));
            }
            books.push(Book {
                isbn: Isbn::new(row.isbn),
                title: row.title,
                author: row.author,
                year: row.year,
                average_rating: row.average_rating,
                rating_count: row.count_ratings as u64,
                image: row.image,
            });
        }
        let catalog = Catalog::new(books)?;
        log::info!(
            "loaded {} books from {}",
            catalog.len(),
            self.books.display()
        );
        Ok(catalog)
    }
}
