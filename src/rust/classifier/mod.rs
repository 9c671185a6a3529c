use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod boosting;
pub mod forest;
pub mod linear_svm;
pub mod logistic;
pub mod naive_bayes;
pub mod tree;
mod utils;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use linear_svm::{LinearSvm, SvmParams};
pub use logistic::{LogisticParams, LogisticRegression};
pub use naive_bayes::{MultinomialNb, NaiveBayesParams};
pub use tree::{DecisionTree, TreeParams};

use crate::error::{ArtifactError, TrainError};
use crate::features::{SparseMatrix, SparseRow};

/// A fitted model that maps a feature row to a class index.
pub trait Classify {
    fn n_classes(&self) -> usize;

    fn predict_row(&self, row: SparseRow<'_>) -> usize;

    fn predict(&self, x: &SparseMatrix) -> Vec<usize> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Fraction of rows whose prediction equals the label; 0.0 for no rows.
    fn score(&self, x: &SparseMatrix, labels: &[usize]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let correct = x
            .rows()
            .zip(labels)
            .filter(|(row, label)| self.predict_row(*row) == **label)
            .count();
        correct as f64 / labels.len() as f64
    }
}

/// The six model variants, in fit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogReg,
    Svm,
    NaiveBayes,
    RandomForest,
    DecisionTree,
    Xgboost,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::LogReg,
        ModelKind::Svm,
        ModelKind::NaiveBayes,
        ModelKind::RandomForest,
        ModelKind::DecisionTree,
        ModelKind::Xgboost,
    ];

    /// Artifact and report name.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LogReg => "log_reg",
            ModelKind::Svm => "svm",
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::RandomForest => "random_forest",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::Xgboost => "xgboost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ArtifactError::UnknownModel(s.to_string()))
    }
}

/// Hyperparameters for every model variant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hyperparameters {
    pub log_reg: LogisticParams,
    pub svm: SvmParams,
    pub naive_bayes: NaiveBayesParams,
    pub random_forest: ForestParams,
    pub decision_tree: TreeParams,
    pub xgboost: BoostingParams,
}

/// Any fitted model, tagged with its kind when persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    LogReg(LogisticRegression),
    Svm(LinearSvm),
    NaiveBayes(MultinomialNb),
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    Xgboost(GradientBoosting),
}

impl FittedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::LogReg(_) => ModelKind::LogReg,
            FittedModel::Svm(_) => ModelKind::Svm,
            FittedModel::NaiveBayes(_) => ModelKind::NaiveBayes,
            FittedModel::RandomForest(_) => ModelKind::RandomForest,
            FittedModel::DecisionTree(_) => ModelKind::DecisionTree,
            FittedModel::Xgboost(_) => ModelKind::Xgboost,
        }
    }

    fn inner(&self) -> &dyn Classify {
        match self {
            FittedModel::LogReg(m) => m,
            FittedModel::Svm(m) => m,
            FittedModel::NaiveBayes(m) => m,
            FittedModel::RandomForest(m) => m,
            FittedModel::DecisionTree(m) => m,
            FittedModel::Xgboost(m) => m,
        }
    }
}

impl Classify for FittedModel {
    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        self.inner().predict_row(row)
    }
}

/// Fits one model variant. `seed` drives every randomized step.
pub fn fit(
    kind: ModelKind,
    params: &Hyperparameters,
    x: &SparseMatrix,
    y: &[usize],
    n_classes: usize,
    seed: u64,
) -> Result<FittedModel, TrainError> {
    let model = match kind {
        ModelKind::LogReg => {
            FittedModel::LogReg(LogisticRegression::fit(&params.log_reg, x, y, n_classes)?)
        }
        ModelKind::Svm => FittedModel::Svm(LinearSvm::fit(&params.svm, x, y, n_classes, seed)?),
        ModelKind::NaiveBayes => {
            FittedModel::NaiveBayes(MultinomialNb::fit(&params.naive_bayes, x, y, n_classes)?)
        }
        ModelKind::RandomForest => FittedModel::RandomForest(RandomForest::fit(
            &params.random_forest,
            x,
            y,
            n_classes,
            seed,
        )?),
        ModelKind::DecisionTree => {
            FittedModel::DecisionTree(DecisionTree::fit(&params.decision_tree, x, y, n_classes)?)
        }
        ModelKind::Xgboost => {
            FittedModel::Xgboost(GradientBoosting::fit(&params.xgboost, x, y, n_classes)?)
        }
    };
    Ok(model)
}

pub(crate) fn check_training_set(
    model: ModelKind,
    x: &SparseMatrix,
    y: &[usize],
    n_classes: usize,
) -> Result<(), TrainError> {
    if n_classes == 0 {
        return Err(TrainError::NoClasses);
    }
    if x.n_rows() == 0 {
        return Err(TrainError::EmptyTrainingSet { model });
    }
    if x.n_rows() != y.len() {
        return Err(TrainError::LengthMismatch {
            model,
            rows: x.n_rows(),
            labels: y.len(),
        });
    }
    if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
        return Err(TrainError::LabelOutOfRange {
            model,
            label,
            n_classes,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Twelve rows, four per class. Class `c` always carries features `2c`
    /// and `2c + 1`, plus a little shared noise on feature 6.
    pub(crate) fn toy_problem() -> (SparseMatrix, Vec<usize>) {
        let mut x = SparseMatrix::new(7);
        let mut y = Vec::new();
        let strengths = [(0.9, 0.4), (0.6, 0.7), (0.8, 0.5), (0.5, 0.8)];
        for class in 0..3 {
            for (i, &(a, b)) in strengths.iter().enumerate() {
                let mut row = vec![(2 * class, a), (2 * class + 1, b)];
                if i % 2 == 0 {
                    row.push((6, 0.2));
                }
                x.push_row(row);
                y.push(class);
            }
        }
        (x, y)
    }

    #[test]
    fn test_model_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.name())
            );
        }
        assert!(matches!(
            "lstm".parse::<ModelKind>(),
            Err(ArtifactError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_every_kind_fits_toy_problem() {
        let (x, y) = toy_problem();
        let params = Hyperparameters::default();
        for kind in ModelKind::ALL {
            let model = fit(kind, &params, &x, &y, 3, 42).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.n_classes(), 3);
            assert!(model.score(&x, &y) >= 0.9, "{} underfits", kind);
        }
    }

    #[test]
    fn test_fitted_model_json_carries_kind() {
        let (x, y) = toy_problem();
        let model = fit(ModelKind::NaiveBayes, &Hyperparameters::default(), &x, &y, 3, 0).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "naive_bayes");

        let restored: FittedModel = serde_json::from_value(json).unwrap();
        assert_eq!(restored.predict(&x), model.predict(&x));
    }

    #[test]
    fn test_check_training_set() {
        let (x, y) = toy_problem();
        assert!(check_training_set(ModelKind::Svm, &x, &y, 3).is_ok());
        assert!(matches!(
            check_training_set(ModelKind::Svm, &x, &y[1..], 3),
            Err(TrainError::LengthMismatch { rows: 12, labels: 11, .. })
        ));
        assert!(matches!(
            check_training_set(ModelKind::Svm, &SparseMatrix::new(7), &[], 3),
            Err(TrainError::EmptyTrainingSet { .. })
        ));
        assert!(matches!(
            check_training_set(ModelKind::Svm, &x, &y, 0),
            Err(TrainError::NoClasses)
        ));
    }

    #[test]
    fn test_score_of_empty_set() {
        let (x, y) = toy_problem();
        let model = fit(ModelKind::DecisionTree, &Hyperparameters::default(), &x, &y, 3, 0).unwrap();
        assert_eq!(model.score(&SparseMatrix::new(7), &[]), 0.0);
    }
}
