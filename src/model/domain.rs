//! Domain types for fitted rating predictors.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::error::{BookrecError, BookrecResult};
use crate::data::domain::{Isbn, UserId};

/// Supported predictor families, in the order they are offered to users.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub enum ModelKind {
    /// Random draws from the trainset rating distribution.
    NormalPredictor,
    /// k-nearest-neighbour collaborative filtering.
    Knn,
    /// Biased matrix factorisation.
    Svd,
    /// Matrix factorisation with implicit feedback.
    SvdPp,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::NormalPredictor,
        ModelKind::Knn,
        ModelKind::Svd,
        ModelKind::SvdPp,
    ];

    /// Method name as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::NormalPredictor => "NormalPredictor",
            ModelKind::Knn => "KNN",
            ModelKind::Svd => "SVD",
            ModelKind::SvdPp => "SVD++",
        }
    }

    /// File stem of the fitted artefact.
    pub fn stem(&self) -> &'static str {
        match self {
            ModelKind::NormalPredictor => "npred",
            ModelKind::Knn => "knn",
            ModelKind::Svd => "svd",
            ModelKind::SvdPp => "svdpp",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = BookrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ModelKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted) || k.stem().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BookrecError::invalid(format!("unknown recommendation method `{s}`")))
    }
}

/// Closed interval ratings are clipped into.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> BookrecResult<Self> {
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(BookrecError::invalid(format!("rating scale [{min}, {max}] is empty")));
        }
        Ok(Self { min, max })
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 10.0,
        }
    }
}

/// A predictor's answer for one (user, book) pair.
///
/// When the algorithm cannot score the pair it falls back to a default
/// value and records the reason in `impossible`.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub impossible: Option<String>,
}

impl Estimate {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            impossible: None,
        }
    }

    pub fn fallback(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            impossible: Some(reason.into()),
        }
    }

    pub fn was_impossible(&self) -> bool {
        self.impossible.is_some()
    }
}

/// A fitted model. Inference only: implementations never update state.
pub trait Predictor {
    fn kind(&self) -> ModelKind;
    fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate>;
}

/// Repository contract for fitted model artefacts.
pub trait ModelRepo {
    fn load_model(&self, kind: ModelKind, scale: RatingScale) -> BookrecResult<Box<dyn Predictor>>;
}
