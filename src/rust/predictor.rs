use log::debug;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::artifacts::ArtifactStore;
use crate::classifier::{Classify, FittedModel, ModelKind};
use crate::config::{Config, PredictionMode};
use crate::error::ArtifactError;
use crate::features::TfidfVectorizer;
use crate::labels::LabelSet;

/// The label(s) predicted for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    /// Serialized as `{"label": <name>}`.
    Best { label: String },
    /// Serialized as `{<model>: <name>, ...}` in fit order.
    All(Vec<(ModelKind, String)>),
}

impl Prediction {
    /// The single label in best mode, or the first model's label otherwise.
    pub fn label(&self) -> Option<&str> {
        match self {
            Prediction::Best { label } => Some(label),
            Prediction::All(labels) => labels.first().map(|(_, label)| label.as_str()),
        }
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Prediction::Best { label } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("label", label)?;
                map.end()
            }
            Prediction::All(labels) => {
                let mut map = serializer.serialize_map(Some(labels.len()))?;
                for (kind, label) in labels {
                    map.serialize_entry(kind.name(), label)?;
                }
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone)]
enum LoadedModels {
    Best(FittedModel),
    All(Vec<FittedModel>),
}

/// Predicts with persisted artifacts; holds nothing between processes.
#[derive(Debug, Clone)]
pub struct Predictor {
    labels: LabelSet,
    vectorizer: TfidfVectorizer,
    models: LoadedModels,
}

impl Predictor {
    /// Loads the vectorizer plus the best model or all six, per the
    /// configured mode.
    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let store = ArtifactStore::new(&config.model_dir);
        let vectorizer = store.load_vectorizer()?;
        let models = match config.prediction_mode {
            PredictionMode::Best => LoadedModels::Best(store.load_best()?),
            PredictionMode::All => LoadedModels::All(
                ModelKind::ALL
                    .into_iter()
                    .map(|kind| store.load_model(kind))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        debug!(
            "Loaded {} mode artifacts from {:?}",
            config.prediction_mode,
            store.dir()
        );
        Ok(Self {
            labels: config.labels.clone(),
            vectorizer,
            models,
        })
    }

    pub fn mode(&self) -> PredictionMode {
        match self.models {
            LoadedModels::Best(_) => PredictionMode::Best,
            LoadedModels::All(_) => PredictionMode::All,
        }
    }

    pub fn predict(&self, text: &str) -> Result<Prediction, ArtifactError> {
        let features = self.vectorizer.transform(&[text]);
        let row = features.row(0);

        match &self.models {
            LoadedModels::Best(model) => Ok(Prediction::Best {
                label: self.label_of(model.predict_row(row))?,
            }),
            LoadedModels::All(models) => models
                .iter()
                .map(|model| -> Result<_, ArtifactError> {
                    Ok((model.kind(), self.label_of(model.predict_row(row))?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Prediction::All),
        }
    }

    fn label_of(&self, index: usize) -> Result<String, ArtifactError> {
        self.labels
            .name(index)
            .map(str::to_string)
            .ok_or(ArtifactError::UnknownClass {
                index,
                len: self.labels.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_json_shape() {
        let best = Prediction::Best {
            label: "joy".to_string(),
        };
        assert_eq!(serde_json::to_string(&best).unwrap(), r#"{"label":"joy"}"#);
        assert_eq!(best.label(), Some("joy"));

        let all = Prediction::All(vec![
            (ModelKind::LogReg, "joy".to_string()),
            (ModelKind::Svm, "fear".to_string()),
        ]);
        assert_eq!(
            serde_json::to_string(&all).unwrap(),
            r#"{"log_reg":"joy","svm":"fear"}"#
        );
    }

    #[test]
    fn test_load_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_model_dir(dir.path());
        assert!(matches!(
            Predictor::load(&config),
            Err(ArtifactError::Missing(_))
        ));
    }
}
