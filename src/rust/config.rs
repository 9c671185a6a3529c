use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

use crate::classifier::Hyperparameters;
use crate::corpus_manager::CorpusManager;
use crate::labels::LabelSet;

pub const DEFAULT_MODEL_DIR: &str = "emotion_models";
pub const DEFAULT_DATASET_PATH: &str = "attached_assets/emotion_dataset.csv";
pub const DEFAULT_MAX_FEATURES: usize = 2000;
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// What a prediction returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionMode {
    /// Only the best model's label.
    #[default]
    Best,
    /// Every model's label, keyed by model name.
    All,
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionMode::Best => f.write_str("best"),
            PredictionMode::All => f.write_str("all"),
        }
    }
}

impl FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(PredictionMode::Best),
            "all" => Ok(PredictionMode::All),
            other => Err(format!("unknown prediction mode '{}'", other)),
        }
    }
}

/// Paths, label set and hyperparameters shared by training and prediction.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_dir: PathBuf,
    /// Local CSV; the reference corpus is used when it does not exist.
    pub dataset_path: PathBuf,
    pub cache_dir: PathBuf,
    pub labels: LabelSet,
    pub max_features: usize,
    /// Share of examples held out for scoring. 0 trains on everything and
    /// skips best-model selection.
    pub holdout_fraction: f64,
    pub seed: u64,
    pub prediction_mode: PredictionMode,
    pub hyperparameters: Hyperparameters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            cache_dir: CorpusManager::get_default_cache_dir(),
            labels: LabelSet::default(),
            max_features: DEFAULT_MAX_FEATURES,
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            seed: DEFAULT_SEED,
            prediction_mode: PredictionMode::default(),
            hyperparameters: Hyperparameters::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `LIMBIC_MODEL_DIR`, `LIMBIC_DATASET`,
    /// `LIMBIC_PREDICTION_MODE` and `LIMBIC_HOLDOUT`. Unparseable values are
    /// logged and ignored. `LIMBIC_CACHE` is honored through the default
    /// cache directory.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("LIMBIC_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Ok(path) = env::var("LIMBIC_DATASET") {
            config.dataset_path = PathBuf::from(path);
        }
        if let Ok(mode) = env::var("LIMBIC_PREDICTION_MODE") {
            match mode.parse() {
                Ok(mode) => config.prediction_mode = mode,
                Err(e) => warn!("ignoring LIMBIC_PREDICTION_MODE: {}", e),
            }
        }
        if let Ok(holdout) = env::var("LIMBIC_HOLDOUT") {
            match holdout.trim().parse::<f64>() {
                Ok(fraction) if (0.0..1.0).contains(&fraction) => {
                    config.holdout_fraction = fraction
                }
                _ => warn!("ignoring LIMBIC_HOLDOUT: '{}' is not in [0, 1)", holdout),
            }
        }
        config
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_prediction_mode(mut self, mode: PredictionMode) -> Self {
        self.prediction_mode = mode;
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model_dir, PathBuf::from("emotion_models"));
        assert_eq!(config.dataset_path, PathBuf::from("attached_assets/emotion_dataset.csv"));
        assert_eq!(config.labels.len(), 6);
        assert_eq!(config.max_features, 2000);
        assert_eq!(config.holdout_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.prediction_mode, PredictionMode::Best);
        assert_eq!(config.hyperparameters.random_forest.n_trees, 20);
        assert_eq!(config.hyperparameters.xgboost.n_rounds, 50);
    }

    #[test]
    fn test_prediction_mode_parsing() {
        assert_eq!("best".parse::<PredictionMode>(), Ok(PredictionMode::Best));
        assert_eq!(" ALL ".parse::<PredictionMode>(), Ok(PredictionMode::All));
        assert!("most".parse::<PredictionMode>().is_err());
        assert_eq!(PredictionMode::All.to_string(), "all");
    }

    #[test]
    fn test_from_env_overrides() {
        env::set_var("LIMBIC_PREDICTION_MODE", "all");
        env::set_var("LIMBIC_HOLDOUT", "1.5");
        let config = Config::from_env();
        assert_eq!(config.prediction_mode, PredictionMode::All);
        // out of range, so the default stays
        assert_eq!(config.holdout_fraction, 0.2);

        env::set_var("LIMBIC_HOLDOUT", "0");
        assert_eq!(Config::from_env().holdout_fraction, 0.0);
        env::remove_var("LIMBIC_PREDICTION_MODE");
        env::remove_var("LIMBIC_HOLDOUT");
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::default()
            .with_model_dir("/tmp/models")
            .with_holdout_fraction(0.0)
            .with_prediction_mode(PredictionMode::All)
            .with_seed(7);
        assert_eq!(config.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.holdout_fraction, 0.0);
        assert_eq!(config.prediction_mode, PredictionMode::All);
        assert_eq!(config.seed, 7);
    }
}
