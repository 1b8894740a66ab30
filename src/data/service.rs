//! Service layer loading the source tables and applying the popularity filter.

use std::collections::{HashMap, HashSet};

use crate::common::config::AppCfg;
use crate::common::error::BookrecResult;
use crate::common::time;

use super::domain::{DataRepo, Dataset, Isbn, PopularityThresholds, RatingTable, UserId};
use super::repo_fs::FsDataRepo;

impl PopularityThresholds {
    pub fn from_cfg(cfg: &AppCfg) -> Self {
        Self {
            min_raters_per_item: cfg.min_raters_per_item,
            min_ratings_per_user: cfg.min_ratings_per_user,
        }
    }
}

/// Keep ratings whose book has enough distinct raters and whose user has
/// enough ratings. Both counts come from the unfiltered table; this is a
/// single pass, not a fixed point.
pub fn filter_popular(ratings: &RatingTable, thresholds: PopularityThresholds) -> RatingTable {
    let mut raters: HashMap<&Isbn, HashSet<UserId>> = HashMap::new();
    let mut per_user: HashMap<UserId, usize> = HashMap::new();
    for row in ratings.rows() {
        raters.entry(&row.item).or_default().insert(row.user);
        *per_user.entry(row.user).or_default() += 1;
    }

    let kept = ratings
        .rows()
        .iter()
        .filter(|row| {
            raters.get(&row.item).map_or(0, HashSet::len) >= thresholds.min_raters_per_item
                && per_user.get(&row.user).copied().unwrap_or(0) >= thresholds.min_ratings_per_user
        })
        .cloned();
    RatingTable::new(kept)
}

/// Load both tables through `repo` and filter the ratings.
pub fn load_with(repo: &dyn DataRepo, thresholds: PopularityThresholds) -> BookrecResult<Dataset> {
    let start = time::now_ms();
    let raw = repo.load_ratings()?;
    let catalog = repo.load_catalog()?;
    let ratings = filter_popular(&raw, thresholds);
    log::info!(
        "popularity filter kept {} of {} ratings across {} users (min raters {}, min ratings {}) in {} ms",
        ratings.len(),
        raw.len(),
        ratings.user_count(),
        thresholds.min_raters_per_item,
        thresholds.min_ratings_per_user,
        time::now_ms().saturating_sub(start)
    );
    Ok(Dataset { ratings, catalog })
}

/// Load the configured CSV files and filter the ratings.
pub fn load_dataset(cfg: &AppCfg) -> BookrecResult<Dataset> {
    load_with(&FsDataRepo::new(cfg), PopularityThresholds::from_cfg(cfg))
}
