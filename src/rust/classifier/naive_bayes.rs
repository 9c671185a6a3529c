use log::warn;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::utils::{argmax, class_scores};
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveBayesParams {
    /// Additive (Laplace/Lidstone) smoothing.
    pub alpha: f64,
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Multinomial naive Bayes over non-negative feature weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    class_log_prior: Array1<f64>,
    /// `(n_features, n_classes)`
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    pub fn fit(
        params: &NaiveBayesParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::NaiveBayes, x, y, n_classes)?;
        if let Some((column, value)) = x.first_negative() {
            return Err(TrainError::NegativeFeature {
                model: ModelKind::NaiveBayes,
                column,
                value,
            });
        }

        let mut feature_count = Array2::<f64>::zeros((x.n_cols(), n_classes));
        let mut class_count = Array1::<f64>::zeros(n_classes);
        for (row, &label) in x.rows().zip(y) {
            class_count[label] += 1.0;
            for (j, v) in row.iter() {
                feature_count[[j, label]] += v;
            }
        }

        for (class, &count) in class_count.iter().enumerate() {
            if count == 0.0 {
                warn!("naive_bayes: class {} has no training examples", class);
            }
        }

        let smoothed = feature_count + params.alpha;
        let totals = smoothed.sum_axis(Axis(0));
        let feature_log_prob = (smoothed / &totals).mapv(f64::ln);
        // an empty class gets the lowest finite log prior so it stays serializable
        let class_log_prior =
            (&class_count / x.n_rows() as f64).mapv(|p| if p > 0.0 { p.ln() } else { f64::MIN });

        Ok(Self {
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Joint log-likelihood of each class for one row.
    pub fn joint_log_likelihood(&self, row: SparseRow<'_>) -> Array1<f64> {
        class_scores(row, &self.feature_log_prob, &self.class_log_prior)
    }
}

impl Classify for MultinomialNb {
    fn n_classes(&self) -> usize {
        self.class_log_prior.len()
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(&self.joint_log_likelihood(row))
    }
}
