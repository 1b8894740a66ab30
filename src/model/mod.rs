//! Fitted rating predictors and the registry that serves them.
//!
//! Fitting happens elsewhere; this module only loads fitted parameters and
//! answers `predict(user, book)`.

pub mod baseline;
pub mod domain;
pub mod knn;
pub mod registry;
pub mod repo_fs;
pub mod svd;

pub use domain::{Estimate, ModelKind, Predictor, RatingScale};
pub use registry::ModelRegistry;
pub use repo_fs::{FsModelRepo, ModelArtefact};
