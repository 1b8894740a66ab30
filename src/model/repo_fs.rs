//! Filesystem repository for fitted model artefacts.
//!
//! One JSON document per model, `<models_dir>/<stem>_model.json`, tagged by
//! `kind` so a file copied under the wrong name is caught at load.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::config::AppCfg;
use crate::common::error::{BookrecError, BookrecResult};

use super::baseline::{NormalParams, NormalPredictor};
use super::domain::{ModelKind, ModelRepo, Predictor, RatingScale};
use super::knn::{KnnParams, KnnPredictor};
use super::svd::{SvdParams, SvdPpParams, SvdPpPredictor, SvdPredictor};

/// Fitted parameters of any supported model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtefact {
    NormalPredictor(NormalParams),
    Knn(KnnParams),
    Svd(SvdParams),
    #[serde(rename = "svdpp")]
    SvdPp(SvdPpParams),
}

impl ModelArtefact {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelArtefact::NormalPredictor(_) => ModelKind::NormalPredictor,
            ModelArtefact::Knn(_) => ModelKind::Knn,
            ModelArtefact::Svd(_) => ModelKind::Svd,
            ModelArtefact::SvdPp(_) => ModelKind::SvdPp,
        }
    }

    /// Validate the parameters and build the matching predictor.
    pub fn into_predictor(self, scale: RatingScale) -> BookrecResult<Box<dyn Predictor>> {
        let model: Box<dyn Predictor> = match self {
            ModelArtefact::NormalPredictor(p) => Box::new(NormalPredictor::new(p, scale)?),
            ModelArtefact::Knn(p) => Box::new(KnnPredictor::new(p, scale)?),
            ModelArtefact::Svd(p) => Box::new(SvdPredictor::new(p, scale)?),
            ModelArtefact::SvdPp(p) => Box::new(SvdPpPredictor::new(p, scale)?),
        };
        Ok(model)
    }
}

/// Loads artefacts from a models directory.
pub struct FsModelRepo {
    root: PathBuf,
}

impl FsModelRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(cfg.models_path())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn artefact_path(&self, kind: ModelKind) -> PathBuf {
        self.root.join(format!("{}_model.json", kind.stem()))
    }

    pub fn read_artefact(path: &Path) -> BookrecResult<ModelArtefact> {
        let file = File::open(path).map_err(|e| BookrecError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| BookrecError::Artefact {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ModelRepo for FsModelRepo {
    fn load_model(&self, kind: ModelKind, scale: RatingScale) -> BookrecResult<Box<dyn Predictor>> {
        let path = self.artefact_path(kind);
        let artefact = Self::read_artefact(&path)?;
        if artefact.kind() != kind {
            return Err(BookrecError::invalid(format!(
                "{} holds a {} model, expected {}",
                path.display(),
                artefact.kind(),
                kind
            )));
        }
        artefact.into_predictor(scale)
    }
}
