//! Process-wide state, loaded once and passed explicitly to every request.

use crate::common::config::AppCfg;
use crate::common::error::BookrecResult;
use crate::data::domain::{Dataset, UserId};
use crate::data::service as data_service;
use crate::model::domain::{ModelKind, RatingScale};
use crate::model::registry::ModelRegistry;
use crate::model::repo_fs::FsModelRepo;

use super::domain::{BookView, Recommendation};
use super::service;

/// Filtered dataset plus fitted models. Immutable after construction.
pub struct AppContext {
    cfg: AppCfg,
    dataset: Dataset,
    registry: ModelRegistry,
}

impl AppContext {
    /// Load the tables and every model named in [`ModelKind::ALL`].
    pub fn load(cfg: AppCfg) -> BookrecResult<Self> {
        let dataset = data_service::load_dataset(&cfg)?;
        let scale = RatingScale::new(cfg.rating_min, cfg.rating_max)?;
        let registry = ModelRegistry::load_all(&FsModelRepo::new(&cfg), &ModelKind::ALL, scale)?;
        Ok(Self::from_parts(cfg, dataset, registry))
    }

    /// Assemble a context from already loaded parts.
    pub fn from_parts(cfg: AppCfg, dataset: Dataset, registry: ModelRegistry) -> Self {
        Self {
            cfg,
            dataset,
            registry,
        }
    }

    pub fn cfg(&self) -> &AppCfg {
        &self.cfg
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The configured number of highest average-rated books.
    pub fn top_rated(&self) -> Vec<BookView> {
        service::top_rated(&self.dataset.catalog, self.cfg.top_rated_limit)
    }

    /// Recommend with the model selected by its method name (e.g. `KNN`).
    pub fn recommend(&self, method: &str, user: UserId, n: usize) -> BookrecResult<Recommendation> {
        let model = self.registry.by_name(method)?;
        Ok(service::recommend(&self.dataset, model, user, n))
    }
}
