//! Data domain: loading the ratings and book tables and filtering by popularity.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{Book, Catalog, Dataset, Isbn, PopularityThresholds, Rating, RatingTable, UserId};
