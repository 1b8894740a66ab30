//! Baseline predictor drawing ratings from a normal distribution.
//!
//! Draws are seeded from (seed, user, book) so that repeated requests rank
//! the catalog the same way.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::common::error::{BookrecError, BookrecResult};
use crate::common::ids::SimpleHash;
use crate::data::domain::{Isbn, UserId};

use super::domain::{Estimate, ModelKind, Predictor, RatingScale};

/// Fitted parameters: mean and standard deviation of the trainset ratings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std: f64,
    #[serde(default)]
    pub seed: u64,
}

pub struct NormalPredictor {
    params: NormalParams,
    scale: RatingScale,
}

impl NormalPredictor {
    pub fn new(params: NormalParams, scale: RatingScale) -> BookrecResult<Self> {
        if !params.mean.is_finite() || !params.std.is_finite() || params.std < 0.0 {
            return Err(BookrecError::invalid(format!(
                "normal predictor needs a finite mean and non-negative std, got N({}, {})",
                params.mean, params.std
            )));
        }
        Ok(Self { params, scale })
    }

    fn rng_for(&self, user: UserId, item: &Isbn) -> StdRng {
        let mut hash = SimpleHash::new();
        hash.update_u64(self.params.seed);
        hash.update_u64(user.raw());
        hash.update(item.as_str().as_bytes());
        StdRng::seed_from_u64(u64::from(hash.finish32()) ^ self.params.seed.rotate_left(32))
    }
}

impl Predictor for NormalPredictor {
    fn kind(&self) -> ModelKind {
        ModelKind::NormalPredictor
    }

    fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate> {
        let mut rng = self.rng_for(user, item);
        // Box-Muller; 1 - u keeps the log argument in (0, 1].
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        Ok(Estimate::new(self.scale.clip(self.params.mean + self.params.std * z)))
    }
}
