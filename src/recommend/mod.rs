//! Recommendation domain: ranking unseen books for a user and the
//! non-personalised top-rated list.

pub mod context;
pub mod domain;
pub mod service;

pub use context::AppContext;
pub use domain::{round2, BookView, Recommendation, REDUCE_REQUEST_NOTICE};
