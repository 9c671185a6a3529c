use std::io;
use std::path::PathBuf;

use crate::classifier::ModelKind;
use crate::corpus_manager::CorpusError;
use crate::labels::LabelError;

/// Errors raised while reading training examples.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("row {row}: {source}")]
    Label {
        row: usize,
        #[source]
        source: LabelError,
    },
    #[error("reference corpus unavailable: {0}")]
    Corpus(#[from] CorpusError),
}

/// Errors raised while fitting the vectorizer or a classifier.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("no training examples")]
    EmptyDataset,
    #[error("label set is empty")]
    NoClasses,
    #[error("held-out fraction must be in [0, 1), got {0}")]
    InvalidHoldout(f64),
    #[error("{model}: cannot fit on an empty training set")]
    EmptyTrainingSet { model: ModelKind },
    #[error("{model}: {rows} feature rows but {labels} labels")]
    LengthMismatch {
        model: ModelKind,
        rows: usize,
        labels: usize,
    },
    #[error("{model}: label {label} is outside 0..{n_classes}")]
    LabelOutOfRange {
        model: ModelKind,
        label: usize,
        n_classes: usize,
    },
    #[error("{model}: negative feature value {value} in column {column}")]
    NegativeFeature {
        model: ModelKind,
        column: usize,
        value: f64,
    },
}

/// Errors raised while persisting or loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact {0:?} not found")]
    Missing(PathBuf),
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {path:?} holds a {found} model, expected {expected}")]
    KindMismatch {
        path: PathBuf,
        expected: ModelKind,
        found: ModelKind,
    },
    #[error("unknown model name '{0}'")]
    UnknownModel(String),
    #[error("model predicted class {index} but only {len} labels are configured")]
    UnknownClass { index: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LimbicError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

pub type Result<T, E = LimbicError> = std::result::Result<T, E>;
