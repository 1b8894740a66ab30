//! Runtime configuration loaded from environment and optional key-value files.
//!
//! Resolution order: built-in defaults, then the `key=value` file named by
//! `BOOKREC_CONFIG`, then `BOOKREC_<KEY>` environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;

use crate::common::error::{BookrecError, BookrecResult};

const ENV_PREFIX: &str = "BOOKREC_";
const CONFIG_FILE_VAR: &str = "BOOKREC_CONFIG";

const KEYS: &[&str] = &[
    "data_root",
    "ratings_file",
    "books_file",
    "models_dir",
    "min_raters_per_item",
    "min_ratings_per_user",
    "rating_min",
    "rating_max",
    "top_rated_limit",
    "log_level",
];

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct AppCfg {
    pub data_root: PathBuf,
    pub ratings_file: PathBuf,
    pub books_file: PathBuf,
    pub models_dir: PathBuf,
    pub min_raters_per_item: usize,
    pub min_ratings_per_user: usize,
    pub rating_min: f64,
    pub rating_max: f64,
    pub top_rated_limit: usize,
    pub log_level: LevelFilter,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            ratings_file: PathBuf::from("Ratings.csv"),
            books_file: PathBuf::from("DataGabungan.csv"),
            models_dir: PathBuf::from("models"),
            min_raters_per_item: 40,
            min_ratings_per_user: 30,
            rating_min: 1.0,
            rating_max: 10.0,
            top_rated_limit: 20,
            log_level: LevelFilter::Info,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> BookrecResult<Self> {
        let file = env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Same as [`AppCfg::load`] but with an explicit config file.
    pub fn load_from(file: Option<&Path>) -> BookrecResult<Self> {
        let mut cfg = Self::default();
        if let Some(path) = file {
            let text = fs::read_to_string(path).map_err(|e| BookrecError::io(path, e))?;
            cfg.apply_file(&text)?;
        }
        for key in KEYS {
            if let Ok(value) = env::var(format!("{ENV_PREFIX}{}", key.to_uppercase())) {
                cfg.set(key, &value)?;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `key=value` lines. Blank lines and `#` comments are skipped.
    pub fn apply_file(&mut self, text: &str) -> BookrecResult<()> {
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                BookrecError::invalid(format!("config line {}: expected key=value", idx + 1))
            })?;
            self.set(key.trim(), value.trim())?;
        }
        Ok(())
    }

    /// Set a single key from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> BookrecResult<()> {
        match key {
            "data_root" => self.data_root = PathBuf::from(value),
            "ratings_file" => self.ratings_file = PathBuf::from(value),
            "books_file" => self.books_file = PathBuf::from(value),
            "models_dir" => self.models_dir = PathBuf::from(value),
            "min_raters_per_item" => self.min_raters_per_item = parse(key, value)?,
            "min_ratings_per_user" => self.min_ratings_per_user = parse(key, value)?,
            "rating_min" => self.rating_min = parse(key, value)?,
            "rating_max" => self.rating_max = parse(key, value)?,
            "top_rated_limit" => self.top_rated_limit = parse(key, value)?,
            "log_level" => self.log_level = parse(key, value)?,
            other => {
                return Err(BookrecError::invalid(format!(
                    "unknown config key `{other}`"
                )))
            }
        }
        Ok(())
    }

    fn validate(&self) -> BookrecResult<()> {
        if self.rating_min.is_nan() || self.rating_max.is_nan() || self.rating_min >= self.rating_max {
            return Err(BookrecError::invalid(format!(
                "rating scale [{}, {}] is empty",
                self.rating_min, self.rating_max
            )));
        }
        Ok(())
    }

    /// Resolve a configured path against `data_root` unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_root.join(path)
        }
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.resolve(&self.ratings_file)
    }

    pub fn books_path(&self) -> PathBuf {
        self.resolve(&self.books_file)
    }

    pub fn models_path(&self) -> PathBuf {
        self.resolve(&self.models_dir)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> BookrecResult<T> {
    value
        .parse()
        .map_err(|_| BookrecError::invalid(format!("config `{key}`: cannot parse `{value}`")))
}
