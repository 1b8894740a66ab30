//! Ranking services: personalised recommendations and the top-rated list.

use std::cmp::Ordering;

use crate::common::time;
use crate::data::domain::{Catalog, Dataset, Isbn, UserId};
use crate::model::domain::Predictor;

use super::domain::{BookView, Recommendation};

/// Catalog books the user has not rated, in catalog order.
///
/// The catalog is the full metadata table, so books removed by the
/// popularity filter are still candidates. Users without ratings get the
/// whole catalog.
pub fn candidates<'a>(dataset: &'a Dataset, user: UserId) -> Vec<&'a Isbn> {
    let seen = dataset.ratings.items_rated_by(user);
    dataset
        .catalog
        .books()
        .iter()
        .map(|b| &b.isbn)
        .filter(|isbn| seen.map_or(true, |s| !s.contains(*isbn)))
        .collect()
}

/// Best first; equal scores ordered by ascending ISBN.
fn by_score_desc(a: &(&Isbn, f64), b: &(&Isbn, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Score every unseen book with `model` and return the best `n`.
///
/// Asking for more books than there are candidates yields
/// [`Recommendation::InsufficientCandidates`] without scoring anything.
/// A candidate whose prediction errors or is not finite is logged and left
/// out, so the list can then be shorter than `n`.
pub fn recommend(dataset: &Dataset, model: &dyn Predictor, user: UserId, n: usize) -> Recommendation {
    let start = time::now_ms();
    let pool = candidates(dataset, user);
    if n > pool.len() {
        log::info!(
            "user {user}: {n} recommendations requested but only {} unseen books",
            pool.len()
        );
        return Recommendation::InsufficientCandidates {
            requested: n,
            available: pool.len(),
        };
    }
    if n == 0 {
        return Recommendation::Ranked(Vec::new());
    }

    let mut scored: Vec<(&Isbn, f64)> = Vec::with_capacity(pool.len());
    let mut fallbacks = 0usize;
    for isbn in pool {
        match model.predict(user, isbn) {
            Ok(est) if est.value.is_finite() => {
                if est.was_impossible() {
                    fallbacks += 1;
                }
                scored.push((isbn, est.value));
            }
            Ok(est) => log::warn!(
                "{} returned {} for user {user} / book {isbn}; skipped",
                model.kind(),
                est.value
            ),
            Err(err) => log::warn!("{err}; skipped"),
        }
    }
    scored.sort_by(by_score_desc);
    scored.truncate(n);

    let books: Vec<BookView> = scored
        .into_iter()
        .filter_map(|(isbn, predicted)| {
            dataset
                .catalog
                .get(isbn)
                .map(|book| BookView::from_book(book).with_prediction(predicted))
        })
        .collect();
    log::info!(
        "user {user}: ranked {} books with {} ({fallbacks} fallback estimates) in {} ms",
        books.len(),
        model.kind(),
        time::now_ms().saturating_sub(start)
    );
    Recommendation::Ranked(books)
}

/// The `limit` books with the highest average rating, ties by ascending ISBN.
pub fn top_rated(catalog: &Catalog, limit: usize) -> Vec<BookView> {
    let mut books: Vec<_> = catalog.books().iter().collect();
    books.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.isbn.cmp(&b.isbn))
    });
    books.into_iter().take(limit).map(BookView::from_book).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::{BookrecError, BookrecResult};
    use crate::data::domain::{Book, Rating, RatingTable};
    use crate::model::domain::{Estimate, ModelKind};

    fn book(isbn: &str, avg: f64) -> Book {
        Book {
            isbn: Isbn::new(isbn),
            title: format!("Book {isbn}"),
            author: "Author".into(),
            year: "2000".into(),
            average_rating: avg,
            rating_count: 10,
            image: String::new(),
        }
    }

    fn dataset() -> Dataset {
        let catalog = Catalog::new(vec![
            book("a", 5.0),
            book("b", 6.0),
            book("c", 7.0),
            book("d", 8.0),
        ])
        .unwrap();
        let ratings = RatingTable::new(vec![
            Rating::new(1, Isbn::new("a"), 9.0),
            Rating::new(1, Isbn::new("c"), 4.0),
        ]);
        Dataset { ratings, catalog }
    }

    /// Scores books by a fixed table; "boom" errors, "nan" is not finite.
    struct Table;

    impl Predictor for Table {
        fn kind(&self) -> ModelKind {
            ModelKind::Svd
        }

        fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate> {
            match item.as_str() {
                "a" => Ok(Estimate::new(9.0)),
                "b" => Ok(Estimate::new(3.0)),
                "c" => Ok(Estimate::new(8.0)),
                "d" => Ok(Estimate::new(3.0)),
                "nan" => Ok(Estimate::new(f64::NAN)),
                _ => Err(BookrecError::Inference {
                    kind: ModelKind::Svd,
                    user,
                    item: item.clone(),
                    reason: "boom".into(),
                }),
            }
        }
    }

    fn isbns(rec: &Recommendation) -> Vec<&str> {
        rec.books()
            .unwrap()
            .iter()
            .map(|b| b.isbn.as_str())
            .collect()
    }

    #[test]
    fn seen_books_are_excluded() {
        let rec = recommend(&dataset(), &Table, UserId(1), 2);
        assert_eq!(isbns(&rec), vec!["b", "d"]);
    }

    #[test]
    fn ties_break_on_isbn() {
        let rec = recommend(&dataset(), &Table, UserId(1), 1);
        assert_eq!(isbns(&rec), vec!["b"]);
        assert_eq!(rec.books().unwrap()[0].predicted_rating, Some(3.0));
    }

    #[test]
    fn cold_user_ranks_the_whole_catalog() {
        let rec = recommend(&dataset(), &Table, UserId(404), 4);
        assert_eq!(isbns(&rec), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn guard_refuses_oversized_requests() {
        let rec = recommend(&dataset(), &Table, UserId(1), 3);
        assert_eq!(
            rec,
            Recommendation::InsufficientCandidates {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn zero_is_a_valid_empty_request() {
        assert_eq!(
            recommend(&dataset(), &Table, UserId(1), 0),
            Recommendation::Ranked(vec![])
        );
    }

    #[test]
    fn failing_candidates_are_skipped() {
        let catalog = Catalog::new(vec![book("a", 5.0), book("boom", 5.0), book("nan", 5.0)]).unwrap();
        let data = Dataset {
            ratings: RatingTable::default(),
            catalog,
        };
        let rec = recommend(&data, &Table, UserId(1), 3);
        assert_eq!(isbns(&rec), vec!["a"]);
    }

    #[test]
    fn result_carries_rounded_metadata() {
        let catalog = Catalog::new(vec![book("a", 8.666_666)]).unwrap();
        let data = Dataset {
            ratings: RatingTable::default(),
            catalog,
        };
        let rec = recommend(&data, &Table, UserId(1), 1);
        let view = &rec.books().unwrap()[0];
        assert_eq!(view.average_rating, 8.67);
        assert_eq!(view.title, "Book a");
    }

    #[test]
    fn top_rated_sorts_and_rounds() {
        let catalog = Catalog::new(vec![
            book("x", 1.0),
            book("y", 9.8),
            book("w", 9.8),
            book("z", 9.546),
        ])
        .unwrap();
        let top = top_rated(&catalog, 3);
        let got: Vec<(&str, f64)> = top
            .iter()
            .map(|b| (b.isbn.as_str(), b.average_rating))
            .collect();
        assert_eq!(got, vec![("w", 9.8), ("y", 9.8), ("z", 9.55)]);
        assert!(top.iter().all(|b| b.predicted_rating.is_none()));
    }

    #[test]
    fn top_rated_with_small_catalog() {
        let catalog = Catalog::new(vec![book("x", 1.0)]).unwrap();
        assert_eq!(top_rated(&catalog, 20).len(), 1);
    }
}
