use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::utils::{argmax, class_scores, softmax_in_place};
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    /// Inverse L2 regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once every gradient component is below this.
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Multinomial logistic regression with an L2 penalty on the weights.
///
/// Minimizes `mean cross-entropy + ||W||² / (2·C·n)` by full-batch gradient
/// descent with a fixed step of `1/L`, where `L` bounds the gradient's
/// Lipschitz constant for the given rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Array2<f64>,
    intercept: Array1<f64>,
}

impl LogisticRegression {
    pub fn fit(
        params: &LogisticParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::LogReg, x, y, n_classes)?;

        let n = x.n_rows() as f64;
        let mut weights = Array2::<f64>::zeros((x.n_cols(), n_classes));
        let mut intercept = Array1::<f64>::zeros(n_classes);

        let reg = 1.0 / (params.c * n);
        let max_sq_norm = x.rows().map(|r| r.squared_norm()).fold(0.0, f64::max);
        let step = 1.0 / (0.5 * (max_sq_norm + 1.0) + reg);

        for iteration in 0..params.max_iter {
            let mut grad_w = &weights * reg;
            let mut grad_b = Array1::<f64>::zeros(n_classes);

            for (row, &label) in x.rows().zip(y) {
                let mut residual = class_scores(row, &weights, &intercept);
                softmax_in_place(&mut residual);
                residual[label] -= 1.0;
                residual /= n;
                for (j, v) in row.iter() {
                    grad_w.row_mut(j).scaled_add(v, &residual);
                }
                grad_b += &residual;
            }

            let max_grad = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0f64, |m, g| m.max(g.abs()));
            if max_grad < params.tol {
                debug!("log_reg converged after {} iterations", iteration);
                break;
            }

            weights.scaled_add(-step, &grad_w);
            intercept.scaled_add(-step, &grad_b);
        }

        Ok(Self { weights, intercept })
    }

    /// Class probabilities for one row.
    pub fn predict_proba_row(&self, row: SparseRow<'_>) -> Array1<f64> {
        let mut scores = class_scores(row, &self.weights, &self.intercept);
        softmax_in_place(&mut scores);
        scores
    }
}

impl Classify for LogisticRegression {
    fn n_classes(&self) -> usize {
        self.intercept.len()
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(&class_scores(row, &self.weights, &self.intercept))
    }
}
