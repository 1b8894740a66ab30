//! Matrix factorisation predictors (SVD and SVD++).
//!
//! Both share the same latent-factor table; SVD++ additionally folds the
//! implicit feedback of the books a user rated into the user vector.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::common::error::{BookrecError, BookrecResult};
use crate::data::domain::{Isbn, UserId};

use super::domain::{Estimate, ModelKind, Predictor, RatingScale};

fn default_biased() -> bool {
    true
}

/// JSON object keys are strings; user ids are parsed from them explicitly so
/// the maps also decode when serde has buffered the document (tagged enums).
mod user_keyed {
    use std::collections::HashMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::data::domain::UserId;

    pub fn serialize<S, T>(map: &HashMap<UserId, T>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        ser.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, D, T>(de: D) -> Result<HashMap<UserId, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        HashMap::<String, T>::deserialize(de)?
            .into_iter()
            .map(|(k, v)| match k.parse::<u64>() {
                Ok(id) => Ok((UserId(id), v)),
                Err(_) => Err(D::Error::custom(format!("`{k}` is not a user id"))),
            })
            .collect()
    }
}

/// Bias and latent factors for one user or book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorEntry {
    #[serde(default)]
    pub bias: f64,
    pub factors: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SvdParams {
    pub global_mean: f64,
    #[serde(default = "default_biased")]
    pub biased: bool,
    #[serde(with = "user_keyed")]
    pub users: HashMap<UserId, FactorEntry>,
    pub items: HashMap<Isbn, FactorEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SvdPpParams {
    pub global_mean: f64,
    #[serde(with = "user_keyed")]
    pub users: HashMap<UserId, FactorEntry>,
    pub items: HashMap<Isbn, FactorEntry>,
    /// Implicit factors `y_j` per book.
    pub implicit: HashMap<Isbn, Vec<f64>>,
    /// Books each user rated in the trainset.
    #[serde(with = "user_keyed")]
    pub rated: HashMap<UserId, Vec<Isbn>>,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Validated factor table shared by both predictors.
struct LatentFactors {
    global_mean: f64,
    users: HashMap<UserId, FactorEntry>,
    items: HashMap<Isbn, FactorEntry>,
    rank: usize,
}

impl LatentFactors {
    fn new(
        global_mean: f64,
        users: HashMap<UserId, FactorEntry>,
        items: HashMap<Isbn, FactorEntry>,
    ) -> BookrecResult<Self> {
        if !global_mean.is_finite() {
            return Err(BookrecError::invalid("factorisation: global_mean is not finite"));
        }
        let rank = users
            .values()
            .chain(items.values())
            .map(|e| e.factors.len())
            .next()
            .unwrap_or(0);
        if let Some((id, _)) = users.iter().find(|(_, e)| e.factors.len() != rank) {
            return Err(rank_mismatch(&format!("user {id}"), rank));
        }
        if let Some((id, _)) = items.iter().find(|(_, e)| e.factors.len() != rank) {
            return Err(rank_mismatch(&format!("book {id}"), rank));
        }
        Ok(Self {
            global_mean,
            users,
            items,
            rank,
        })
    }

    /// `mu + b_u + b_i`, dropping the bias of whichever side is unknown.
    fn baseline(&self, user: Option<&FactorEntry>, item: Option<&FactorEntry>) -> f64 {
        self.global_mean + user.map_or(0.0, |u| u.bias) + item.map_or(0.0, |i| i.bias)
    }
}

fn rank_mismatch(what: &str, rank: usize) -> BookrecError {
    BookrecError::invalid(format!("factorisation: {what} does not have {rank} factors"))
}

pub struct SvdPredictor {
    factors: LatentFactors,
    biased: bool,
    scale: RatingScale,
}

impl SvdPredictor {
    pub fn new(params: SvdParams, scale: RatingScale) -> BookrecResult<Self> {
        Ok(Self {
            factors: LatentFactors::new(params.global_mean, params.users, params.items)?,
            biased: params.biased,
            scale,
        })
    }
}

impl Predictor for SvdPredictor {
    fn kind(&self) -> ModelKind {
        ModelKind::Svd
    }

    fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate> {
        let u = self.factors.users.get(&user);
        let i = self.factors.items.get(item);
        let value = match (self.biased, u, i) {
            (true, Some(u), Some(i)) => {
                self.factors.baseline(Some(u), Some(i)) + dot(&i.factors, &u.factors)
            }
            (true, u, i) => self.factors.baseline(u, i),
            (false, Some(u), Some(i)) => dot(&i.factors, &u.factors),
            (false, _, _) => {
                return Ok(Estimate::fallback(
                    self.scale.clip(self.factors.global_mean),
                    "user and/or book is unknown",
                ))
            }
        };
        Ok(Estimate::new(self.scale.clip(value)))
    }
}

pub struct SvdPpPredictor {
    factors: LatentFactors,
    /// `p_u + |I_u|^-1/2 * sum(y_j)`, computed once per user at load.
    user_vectors: HashMap<UserId, Vec<f64>>,
    scale: RatingScale,
}

impl SvdPpPredictor {
    pub fn new(params: SvdPpParams, scale: RatingScale) -> BookrecResult<Self> {
        let factors = LatentFactors::new(params.global_mean, params.users, params.items)?;
        let rank = factors.rank;
        if let Some((id, _)) = params.implicit.iter().find(|(_, y)| y.len() != rank) {
            return Err(rank_mismatch(&format!("implicit factors of book {id}"), rank));
        }

        let mut user_vectors = HashMap::with_capacity(factors.users.len());
        for (user, entry) in &factors.users {
            let mut vector = entry.factors.clone();
            let rated = params.rated.get(user).map(Vec::as_slice).unwrap_or_default();
            if !rated.is_empty() {
                let norm = (rated.len() as f64).sqrt().recip();
                for item in rated {
                    let y = params.implicit.get(item).ok_or_else(|| {
                        BookrecError::invalid(format!(
                            "svd++: user {user} rated book {item} which has no implicit factors"
                        ))
                    })?;
                    for (v, yj) in vector.iter_mut().zip(y) {
                        *v += norm * yj;
                    }
                }
            }
            user_vectors.insert(*user, vector);
        }

        Ok(Self {
            factors,
            user_vectors,
            scale,
        })
    }
}

impl Predictor for SvdPpPredictor {
    fn kind(&self) -> ModelKind {
        ModelKind::SvdPp
    }

    fn predict(&self, user: UserId, item: &Isbn) -> BookrecResult<Estimate> {
        let u = self.factors.users.get(&user);
        let i = self.factors.items.get(item);
        let mut value = self.factors.baseline(u, i);
        if let (Some(vector), Some(i)) = (self.user_vectors.get(&user), i) {
            value += dot(&i.factors, vector);
        }
        Ok(Estimate::new(self.scale.clip(value)))
    }
}
