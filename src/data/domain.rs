//! Core dataset definitions: ratings, books and the tables holding them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{BookrecError, BookrecResult};

/// Numeric reader identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        UserId(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Book identifier (ISBN as found in the source data, not normalised).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(String);

impl Isbn {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single explicit rating. Zero never survives loading.
#[derive(Clone, Debug, PartialEq)]
pub struct Rating {
    pub user: UserId,
    pub item: Isbn,
    pub value: f64,
}

impl Rating {
    pub fn new(user: u64, item: Isbn, value: f64) -> Self {
        Self {
            user: UserId(user),
            item,
            value,
        }
    }
}

/// In-memory ratings table with a per-user index of rated books.
#[derive(Clone, Debug, Default)]
pub struct RatingTable {
    rows: Vec<Rating>,
    by_user: HashMap<UserId, HashSet<Isbn>>,
}

impl RatingTable {
    /// Build a table, dropping zero ("not rated") entries.
    pub fn new(rows: impl IntoIterator<Item = Rating>) -> Self {
        let rows: Vec<Rating> = rows.into_iter().filter(|r| r.value != 0.0).collect();
        let mut by_user: HashMap<UserId, HashSet<Isbn>> = HashMap::new();
        for row in &rows {
            by_user.entry(row.user).or_default().insert(row.item.clone());
        }
        Self { rows, by_user }
    }

    pub fn rows(&self) -> &[Rating] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Books the user has rated; `None` for users with no surviving ratings.
    pub fn items_rated_by(&self, user: UserId) -> Option<&HashSet<Isbn>> {
        self.by_user.get(&user)
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Number of rows whose (user, book) pair was already seen earlier.
    pub fn duplicate_pairs(&self) -> usize {
        let distinct: usize = self.by_user.values().map(HashSet::len).sum();
        self.rows.len() - distinct
    }
}

/// Display metadata for one book.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub year: String,
    pub average_rating: f64,
    pub rating_count: u64,
    pub image: String,
}

/// Book metadata table. Keeps load order and guarantees unique ISBNs.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    books: Vec<Book>,
    index: HashMap<Isbn, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting repeated ISBNs.
    pub fn new(books: Vec<Book>) -> BookrecResult<Self> {
        let mut index = HashMap::with_capacity(books.len());
        for (pos, book) in books.iter().enumerate() {
            if index.insert(book.isbn.clone(), pos).is_some() {
                return Err(BookrecError::DuplicateItem(book.isbn.clone()));
            }
        }
        Ok(Self { books, index })
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, isbn: &Isbn) -> Option<&Book> {
        self.index.get(isbn).map(|&pos| &self.books[pos])
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Popularity thresholds applied once at load time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PopularityThresholds {
    pub min_raters_per_item: usize,
    pub min_ratings_per_user: usize,
}

/// Loaded, filtered ratings plus the full catalog. Read-only after startup.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub ratings: RatingTable,
    pub catalog: Catalog,
}

/// Repository contract for the two source tables.
pub trait DataRepo {
    fn load_ratings(&self) -> BookrecResult<RatingTable>;
    fn load_catalog(&self) -> BookrecResult<Catalog>;
}
