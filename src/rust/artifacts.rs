//! On-disk layout of trained artifacts.
//!
//! ```text
//! <model_dir>/
//!     vectorizer.json
//!     log_reg.json  svm.json  naive_bayes.json  ...
//!     best_model.json    (only when a held-out split picked a winner)
//!     best_model.txt     (the winner's name)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::classifier::{FittedModel, ModelKind};
use crate::config::PredictionMode;
use crate::error::ArtifactError;
use crate::features::TfidfVectorizer;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const BEST_MODEL_FILE: &str = "best_model.json";
pub const BEST_NAME_FILE: &str = "best_model.txt";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.name()))
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    pub fn best_model_path(&self) -> PathBuf {
        self.dir.join(BEST_MODEL_FILE)
    }

    pub fn best_name_path(&self) -> PathBuf {
        self.dir.join(BEST_NAME_FILE)
    }

    /// Whether every file a predictor in `mode` reads is present.
    pub fn has_artifacts(&self, mode: PredictionMode) -> bool {
        if !self.vectorizer_path().exists() {
            return false;
        }
        match mode {
            PredictionMode::Best => self.best_model_path().exists() && self.best_name_path().exists(),
            PredictionMode::All => ModelKind::ALL
                .into_iter()
                .all(|kind| self.model_path(kind).exists()),
        }
    }

    pub fn save_vectorizer(&self, vectorizer: &TfidfVectorizer) -> Result<PathBuf, ArtifactError> {
        let path = self.vectorizer_path();
        self.write_json(&path, vectorizer)?;
        Ok(path)
    }

    pub fn load_vectorizer(&self) -> Result<TfidfVectorizer, ArtifactError> {
        read_json(&self.vectorizer_path())
    }

    pub fn save_model(&self, model: &FittedModel) -> Result<PathBuf, ArtifactError> {
        let path = self.model_path(model.kind());
        self.write_json(&path, model)?;
        Ok(path)
    }

    pub fn load_model(&self, kind: ModelKind) -> Result<FittedModel, ArtifactError> {
        let path = self.model_path(kind);
        let model: FittedModel = read_json(&path)?;
        check_kind(path, kind, &model)?;
        Ok(model)
    }

    /// Writes the best model and the sidecar naming it.
    pub fn save_best(&self, model: &FittedModel) -> Result<PathBuf, ArtifactError> {
        let path = self.best_model_path();
        self.write_json(&path, model)?;
        let name_path = self.best_name_path();
        fs::write(&name_path, model.kind().name()).map_err(|source| ArtifactError::Io {
            path: name_path,
            source,
        })?;
        Ok(path)
    }

    pub fn read_best_name(&self) -> Result<ModelKind, ArtifactError> {
        let path = self.best_name_path();
        fs::read_to_string(&path)
            .map_err(|source| io_error(&path, source))?
            .parse()
    }

    /// Loads the best model, checking it against the sidecar name.
    pub fn load_best(&self) -> Result<FittedModel, ArtifactError> {
        let expected = self.read_best_name()?;
        let path = self.best_model_path();
        let model: FittedModel = read_json(&path)?;
        check_kind(path, expected, &model)?;
        Ok(model)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let bytes = serde_json::to_vec(value).map_err(|source| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, bytes).map_err(|source| io_error(path, source))?;
        debug!("wrote {:?}", path);
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn check_kind(path: PathBuf, expected: ModelKind, model: &FittedModel) -> Result<(), ArtifactError> {
    if model.kind() != expected {
        return Err(ArtifactError::KindMismatch {
            path,
            expected,
            found: model.kind(),
        });
    }
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> ArtifactError {
    if source.kind() == io::ErrorKind::NotFound {
        ArtifactError::Missing(path.to_path_buf())
    } else {
        ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
