//! Registry mapping method names to fitted predictors.

use std::collections::BTreeMap;

use crate::common::error::{BookrecError, BookrecResult};
use crate::common::time;

use super::domain::{ModelKind, ModelRepo, Predictor, RatingScale};

/// Fitted predictors keyed by kind. Built once at startup, read-only after.
#[derive(Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKind, Box<dyn Predictor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every kind in `kinds` through `repo`; any failure aborts startup.
    pub fn load_all(
        repo: &dyn ModelRepo,
        kinds: &[ModelKind],
        scale: RatingScale,
    ) -> BookrecResult<Self> {
        let mut registry = Self::new();
        for &kind in kinds {
            let start = time::now_ms();
            let model = repo.load_model(kind, scale)?;
            log::info!(
                "loaded {kind} model in {} ms",
                time::now_ms().saturating_sub(start)
            );
            registry.register(model);
        }
        Ok(registry)
    }

    /// Add a predictor, replacing any earlier one of the same kind.
    pub fn register(&mut self, model: Box<dyn Predictor>) {
        let kind = model.kind();
        if self.models.insert(kind, model).is_some() {
            log::warn!("replaced previously registered {kind} model");
        }
    }

    pub fn get(&self, kind: ModelKind) -> BookrecResult<&dyn Predictor> {
        self.models
            .get(&kind)
            .map(|m| m.as_ref())
            .ok_or(BookrecError::ModelMissing(kind))
    }

    /// Resolve a user-facing method name such as `SVD++`.
    pub fn by_name(&self, method: &str) -> BookrecResult<&dyn Predictor> {
        self.get(method.parse()?)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ModelKind> + '_ {
        self.models.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
