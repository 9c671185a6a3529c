//! A short-text emotion classifier.
//!
//! Texts are turned into TF-IDF vectors and scored by six classic models:
//! logistic regression, a linear SVM, multinomial naive Bayes, a random
//! forest, a decision tree and gradient-boosted trees. Training picks the
//! model with the best held-out accuracy and persists everything as JSON.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use limbic::{Config, Predictor, Trainer};
//!
//! let config = Config::default().with_model_dir("emotion_models");
//! let report = Trainer::new(config.clone()).train().await?;
//! println!("best model: {:?}", report.best);
//!
//! let predictor = Predictor::load(&config)?;
//! let prediction = predictor.predict("I am so happy today")?;
//! println!("{}", limbic::output::to_json_line(&prediction)?);
//! # Ok(())
//! # }
//! ```
//!
//! Training and prediction are separate steps; callers that want
//! load-or-train behavior check [`ArtifactStore::has_artifacts`] first.

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod corpus_manager;
pub mod dataset;
pub mod error;
pub mod features;
pub mod labels;
pub mod output;
pub mod predictor;
pub mod training;

pub use artifacts::ArtifactStore;
pub use classifier::{Classify, FittedModel, Hyperparameters, ModelKind};
pub use config::{Config, PredictionMode};
pub use corpus_manager::{CorpusError, CorpusInfo, CorpusManager};
pub use dataset::{load_examples, read_csv, DataSource, Example};
pub use error::{ArtifactError, DatasetError, LimbicError, Result, TrainError};
pub use features::{SparseMatrix, TfidfVectorizer};
pub use labels::{LabelError, LabelSet, EMOTIONS};
pub use predictor::{Prediction, Predictor};
pub use training::{holdout_split, ModelScore, Trainer, TrainingReport};

pub fn init_logger() {
    env_logger::init();
}
