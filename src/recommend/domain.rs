//! Result types handed to the display layer.

use serde::Serialize;

use crate::data::domain::{Book, Isbn};

/// Message shown when more recommendations are requested than can be made.
pub const REDUCE_REQUEST_NOTICE: &str = "Please reduce your recommendation request";

/// Round to two decimals, halves away from zero (`f64::round`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A book as displayed: `average_rating` rounded, `predicted_rating` only set
/// on personalised results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookView {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub year: String,
    pub average_rating: f64,
    pub rating_count: u64,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_rating: Option<f64>,
}

impl BookView {
    pub fn from_book(book: &Book) -> Self {
        Self {
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.clone(),
            average_rating: round2(book.average_rating),
            rating_count: book.rating_count,
            image: book.image.clone(),
            predicted_rating: None,
        }
    }

    pub fn with_prediction(mut self, predicted: f64) -> Self {
        self.predicted_rating = Some(predicted);
        self
    }
}

/// Outcome of a personalised request.
#[derive(Clone, Debug, PartialEq)]
pub enum Recommendation {
    /// Books ordered by predicted rating, best first.
    Ranked(Vec<BookView>),
    /// `requested` exceeds the `available` unseen books; nothing was scored.
    InsufficientCandidates { requested: usize, available: usize },
}

impl Recommendation {
    pub fn books(&self) -> Option<&[BookView]> {
        match self {
            Recommendation::Ranked(books) => Some(books.as_slice()),
            Recommendation::InsufficientCandidates { .. } => None,
        }
    }
}
