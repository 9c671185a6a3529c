use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::artifacts::ArtifactStore;
use crate::classifier::{self, Classify, FittedModel, ModelKind};
use crate::config::Config;
use crate::dataset::{load_examples, Example};
use crate::error::{Result, TrainError};
use crate::features::TfidfVectorizer;

/// Held-out accuracy of one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelScore {
    pub model: ModelKind,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary_size: usize,
    /// In fit order; empty when nothing was held out.
    pub scores: Vec<ModelScore>,
    pub best: Option<ModelScore>,
}

/// Splits `0..n` into `(train, test)` row indices after a seeded shuffle.
/// The test part holds `ceil(n * fraction)` rows.
pub fn holdout_split(
    n: usize,
    fraction: f64,
    seed: u64,
) -> std::result::Result<(Vec<usize>, Vec<usize>), TrainError> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(TrainError::InvalidHoldout(fraction));
    }
    let mut indices: Vec<usize> = (0..n).collect();
    if fraction == 0.0 {
        return Ok((indices, Vec::new()));
    }
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let test_size = ((n as f64) * fraction).ceil() as usize;
    let train = indices.split_off(test_size.min(n));
    Ok((train, indices))
}

/// Fits the vectorizer and every model variant, then persists them.
pub struct Trainer {
    config: Config,
    store: ArtifactStore,
}

impl Trainer {
    pub fn new(config: Config) -> Self {
        let store = ArtifactStore::new(&config.model_dir);
        Self { config, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Loads the configured dataset and trains on it.
    pub async fn train(&self) -> Result<TrainingReport> {
        let examples = load_examples(&self.config).await?;
        self.train_on(&examples)
    }

    pub fn train_on(&self, examples: &[Example]) -> Result<TrainingReport> {
        let config = &self.config;
        if examples.is_empty() {
            return Err(TrainError::EmptyDataset.into());
        }
        if config.labels.is_empty() {
            return Err(TrainError::NoClasses.into());
        }
        let n_classes = config.labels.len();

        let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
        let labels: Vec<usize> = examples.iter().map(|e| e.label).collect();
        let mut vectorizer = TfidfVectorizer::new(config.max_features);
        let features = vectorizer.fit_transform(&texts);
        info!(
            "Vectorized {} examples over {} terms",
            examples.len(),
            vectorizer.vocabulary_size()
        );

        let (train_rows, test_rows) =
            holdout_split(examples.len(), config.holdout_fraction, config.seed)?;
        let evaluate = !test_rows.is_empty();
        if !evaluate {
            warn!("Nothing held out: models are fit on every example and no best model is chosen");
        }
        let x_train = features.select(&train_rows);
        let y_train: Vec<usize> = train_rows.iter().map(|&i| labels[i]).collect();
        let x_test = features.select(&test_rows);
        let y_test: Vec<usize> = test_rows.iter().map(|&i| labels[i]).collect();

        let mut models: Vec<FittedModel> = Vec::with_capacity(ModelKind::ALL.len());
        let mut scores = Vec::new();
        let mut best: Option<(ModelScore, usize)> = None;
        let mut best_accuracy = 0.0;
        for kind in ModelKind::ALL {
            let start = Instant::now();
            let model = classifier::fit(
                kind,
                &config.hyperparameters,
                &x_train,
                &y_train,
                n_classes,
                config.seed,
            )?;
            let elapsed = start.elapsed();

            if evaluate {
                let accuracy = model.score(&x_test, &y_test);
                info!("{}: accuracy {:.4} (fit in {:.2?})", kind, accuracy, elapsed);
                let score = ModelScore {
                    model: kind,
                    accuracy,
                };
                // first model to reach the top accuracy keeps it
                if accuracy > best_accuracy {
                    best_accuracy = accuracy;
                    best = Some((score, models.len()));
                }
                scores.push(score);
            } else {
                info!("{}: fit in {:.2?}", kind, elapsed);
            }
            models.push(model);
        }

        for model in &models {
            let path = self.store.save_model(model)?;
            info!("Saved {} to {:?}", model.kind(), path);
        }
        let path = self.store.save_vectorizer(&vectorizer)?;
        info!("Saved vectorizer to {:?}", path);
        if let Some((score, index)) = best {
            self.store.save_best(&models[index])?;
            info!(
                "Best model: {} with accuracy {:.4}",
                score.model, score.accuracy
            );
        } else if evaluate {
            warn!("Every model scored 0.0; no best model was saved");
        }

        Ok(TrainingReport {
            samples: examples.len(),
            train_size: train_rows.len(),
            test_size: test_rows.len(),
            vocabulary_size: vectorizer.vocabulary_size(),
            scores,
            best: best.map(|(score, _)| score),
        })
    }
}
