//! k-nearest-neighbour collaborative filtering over a fitted similarity table.
//!
//! The estimate for `(x, y)` is the similarity-weighted mean of the ratings
//! given to `y` by the `k` entities most similar to `x`. With user-based
//! neighbourhoods `x` is the user and `y` the book; item-based swaps them.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::common::error::{BookrecError, BookrecResult};
use crate::data::domain::{Isbn, UserId};

use super::domain::{Estimate, ModelKind, Predictor, RatingScale};

fn default_k() -> usize {
    40
}

fn default_min_k() -> usize {
    1
}

fn default_user_based() -> bool {
    true
}

/// A trainset rating carried by the artefact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub user: UserId,
    pub item: Isbn,
    pub rating: f64,
}

/// Numeric keys name users, string keys name books.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeighbourKey {
    User(UserId),
    Item(Isbn),
}

/// One symmetric similarity. Absent pairs have similarity zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEntry {
    pub a: NeighbourKey,
    pub b: NeighbourKey,
    pub sim: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_min_k")]
    pub min_k: usize,
    #[serde(default = "default_user_based")]
    pub user_based: bool,
    pub global_mean: f64,
    pub ratings: Vec<RatingEntry>,
    #[serde(default)]
    pub similarities: Vec<SimilarityEntry>,
}

/// Ratings indexed by target plus the similarity table between neighbours.
struct Neighbourhood<X, Y> {
    known: HashSet<X>,
    raters: HashMap<Y, Vec<(X, f64)>>,
    sims: HashMap<X, HashMap<X, f64>>,
}

impl<X: Eq + Hash + Clone, Y: Eq + Hash> Neighbourhood<X, Y> {
    fn new(ratings: impl IntoIterator<Item = (X, Y, f64)>) -> Self {
        let mut known = HashSet::new();
        let mut raters: HashMap<Y, Vec<(X, f64)>> = HashMap::new();
        for (x, y, r) in ratings {
            known.insert(x.clone());
            raters.entry(y).or_default().push((x, r));
        }
        Self {
            known,
            raters,
            sims: HashMap::new(),
        }
    }

    fn add_similarity(&mut self, a: X, b: X, sim: f64) {
        self.sims.entry(a.clone()).or_default().insert(b.clone(), sim);
        self.sims.entry(b).or_default().insert(a, sim);
    }

    fn estimate(&self, x: &X, y: &Y, k: usize, min_k: usize) -> Result<f64, &'static str> {
        let raters = match self.raters.get(y) {
            Some(raters) if self.known.contains(x) => raters,
            _ => return Err("user and/or book is unknown"),
        };
        let row = self.sims.get(x);
        let mut neighbours: Vec<(f64, f64)> = raters
            .iter()
            .map(|(other, r)| {
                let sim = row.and_then(|m| m.get(other)).copied().unwrap_or(0.0);
                (sim, *r)
            })
            .collect();
        neighbours.sort_by(|a, b| b.0.total_cmp(&a.0));
        neighbours.truncate(k);

        let (mut sum_sim, mut sum_ratings, mut actual_k) = (0.0, 0.0, 0usize);
        for (sim, r) in neighbours {
            if sim > 0.0 {
                sum_sim += sim;
                sum_ratings += sim * r;
                actual_k += 1;
            }
        }
        if actual_k < min_k || sum_sim == 0.0 {
            return Err("not enough neighbours");
        }
        Ok(sum_ratings / sum_sim)
    }
}

enum Orientation {
    UserBased(Neighbourhood<UserId, Isbn>),
    ItemBased(Neighbourhood<Isbn, UserId>),
}

pub struct KnnPredictor {
    k: usize,
    min_k: usize,
    global_mean: f64,
    scale: RatingScale,
    orientation: Orientation,
}

impl KnnPredictor {
    pub fn new(params: KnnParams, scale: RatingScale) -> BookrecResult<Self> {
        if params.k == 0 {
            return Err(BookrecError::invalid("knn: k must be at least 1"));
        }
        if !params.global_mean.is_finite() {
            return Err(BookrecError::invalid("knn: global_mean is not finite"));
        }
        let ratings = params.ratings.into_iter();
        let orientation = if params.user_based {
            let mut hood = Neighbourhood::new(ratings.map(|e| (e.user, e.item, e.rating)));
            for entry in params.similarities {
                match (entry.a, entry.b) {
                    (NeighbourKey::User(a), NeighbourKey::User(b)) => {
                        hood.add_similarity(a, b, entry.sim)
                    }
                    _ => {
                        return Err(BookrecError::invalid(
                            "knn: user-based similarities must pair two user ids",
                        ))
                    }
                }
            }
            Orientation::UserBased(hood)
        } else {
            let mut hood = Neighbourhood::new(ratings.map(|e| (e.item, e.user, e.rating)));
            for entry in params.similarities {
                match (entry.a, entry.b) {
                    (NeighbourKey::Item(a), NeighbourKey::Item(b)) => {
                        hood.add_similarity(a, b, entry.sim)
                    }
                    _ => {
                        return Err(BookrecError::invalid(
                            "knn: item-based similarities must pair two isbns",
                        ))
                    }
                }
            }
            Orientation::ItemBased(hood)
        };
        Ok(Self {
            k: params.k,
            min_k: params.min_k,
            global_mean: params.global_mean,
            scale,
            orientation,
        })
    }
}

impl Predictor for KnnPredictor {
    fn kind(&self) -> ModelKind {
        ModelKind::Knn
    }

    fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate> {
        let result = match &self.orientation {
            Orientation::UserBased(hood) => hood.estimate(&user, item, self.k, self.min_k),
            Orientation::ItemBased(hood) => hood.estimate(item, &user, self.k, self.min_k),
        };
        Ok(match result {
            Ok(value) => Estimate::new(self.scale.clip(value)),
            Err(reason) => Estimate::fallback(self.scale.clip(self.global_mean), reason),
        })
    }
}
