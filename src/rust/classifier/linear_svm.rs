use log::debug;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::utils::{argmax, class_scores};
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    pub c: f64,
    /// Maximum number of passes over the training rows, per class.
    pub max_iter: usize,
    /// Stop once the projected-gradient spread falls below this.
    pub tol: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// One-vs-rest linear SVM with squared hinge loss and an L2 penalty.
///
/// Each binary problem is solved in the dual by coordinate descent; the
/// intercept is learned as the weight of a constant feature equal to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    weights: Array2<f64>,
    intercept: Array1<f64>,
}

impl LinearSvm {
    pub fn fit(
        params: &SvmParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
        seed: u64,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::Svm, x, y, n_classes)?;

        let diag = 0.5 / params.c;
        let q_diag: Vec<f64> = x.rows().map(|r| r.squared_norm() + 1.0 + diag).collect();

        let mut weights = Array2::<f64>::zeros((x.n_cols(), n_classes));
        let mut intercept = Array1::<f64>::zeros(n_classes);
        for class in 0..n_classes {
            let targets: Vec<f64> = y
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(class as u64));
            let (w, b) = fit_binary(params, x, &targets, &q_diag, diag, &mut rng);
            weights.column_mut(class).assign(&w);
            intercept[class] = b;
        }

        Ok(Self { weights, intercept })
    }

    /// Per-class decision values for one row.
    pub fn decision_function(&self, row: SparseRow<'_>) -> Array1<f64> {
        class_scores(row, &self.weights, &self.intercept)
    }
}

fn fit_binary(
    params: &SvmParams,
    x: &SparseMatrix,
    targets: &[f64],
    q_diag: &[f64],
    diag: f64,
    rng: &mut StdRng,
) -> (Array1<f64>, f64) {
    let n = x.n_rows();
    let mut w = Array1::<f64>::zeros(x.n_cols());
    let mut b = 0.0;
    let mut alpha = vec![0.0; n];
    let mut order: Vec<usize> = (0..n).collect();

    for epoch in 0..params.max_iter {
        order.shuffle(rng);
        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;

        for &i in &order {
            let row = x.row(i);
            let yi = targets[i];
            let g = yi * (row.dot(w.view()) + b) - 1.0 + diag * alpha[i];
            let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > 1e-12 {
                let old = alpha[i];
                alpha[i] = (old - g / q_diag[i]).max(0.0);
                let delta = (alpha[i] - old) * yi;
                for (j, v) in row.iter() {
                    w[j] += delta * v;
                }
                b += delta;
            }
        }

        if pg_max - pg_min < params.tol {
            debug!("svm binary problem converged after {} epochs", epoch + 1);
            break;
        }
    }

    (w, b)
}

impl Classify for LinearSvm {
    fn n_classes(&self) -> usize {
        self.intercept.len()
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(&self.decision_function(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::toy_problem;

    #[test]
    fn test_separates_toy_problem() {
        let (x, y) = toy_problem();
        let model = LinearSvm::fit(&SvmParams::default(), &x, &y, 3, 42).unwrap();
        assert_eq!(model.predict(&x), y);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = toy_problem();
        let a = LinearSvm::fit(&SvmParams::default(), &x, &y, 3, 7).unwrap();
        let b = LinearSvm::fit(&SvmParams::default(), &x, &y, 3, 7).unwrap();
        assert_eq!(a, b);
    }
}
