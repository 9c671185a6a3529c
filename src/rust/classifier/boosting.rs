use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::tree::{grow, Criterion, Tree};
use super::utils::{argmax, softmax_in_place};
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// L2 penalty on leaf weights.
    pub lambda: f64,
    /// Minimum loss reduction required to split.
    pub gamma: f64,
    /// Minimum hessian sum in each child.
    pub min_child_weight: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 50,
            max_depth: 4,
            learning_rate: 0.3,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GradPair {
    g: f64,
    h: f64,
}

/// Second-order split gain over per-sample gradients and hessians.
struct GradientCriterion<'a> {
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoostingParams,
}

impl Criterion for GradientCriterion<'_> {
    type Stats = GradPair;

    fn empty(&self) -> GradPair {
        GradPair::default()
    }

    fn add_sample(&self, stats: &mut GradPair, sample: usize) {
        stats.g += self.grad[sample];
        stats.h += self.hess[sample];
    }

    fn merge(&self, stats: &mut GradPair, other: &GradPair) {
        stats.g += other.g;
        stats.h += other.h;
    }

    fn difference(&self, total: &GradPair, part: &GradPair) -> GradPair {
        GradPair {
            g: total.g - part.g,
            h: total.h - part.h,
        }
    }

    fn weight(&self, stats: &GradPair) -> f64 {
        stats.h
    }

    fn min_child_weight(&self) -> f64 {
        self.params.min_child_weight
    }

    fn score(&self, stats: &GradPair) -> f64 {
        0.5 * stats.g * stats.g / (stats.h + self.params.lambda)
    }

    fn min_gain(&self) -> f64 {
        self.params.gamma.max(1e-12)
    }

    fn leaf_value(&self, stats: &GradPair) -> Vec<f64> {
        vec![-self.params.learning_rate * stats.g / (stats.h + self.params.lambda)]
    }
}

/// Gradient-boosted regression trees under the softmax objective: each round
/// adds one tree per class, fitted to that class's gradient and hessian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    n_classes: usize,
    /// `rounds[r][c]` is round `r`'s tree for class `c`.
    rounds: Vec<Vec<Tree>>,
    /// Training log-loss after each round.
    train_log_loss: Vec<f64>,
}

impl GradientBoosting {
    pub fn fit(
        params: &BoostingParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::Xgboost, x, y, n_classes)?;

        let n = x.n_rows();
        let samples: Vec<usize> = (0..n).collect();
        let mut margins = Array2::<f64>::zeros((n, n_classes));
        let mut rounds = Vec::with_capacity(params.n_rounds);
        let mut train_log_loss = Vec::with_capacity(params.n_rounds);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        let mut proba = softmax_rows(&margins);
        for round in 0..params.n_rounds {
            let mut trees = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                for i in 0..n {
                    let p = proba[[i, class]];
                    let target = if y[i] == class { 1.0 } else { 0.0 };
                    grad[i] = p - target;
                    hess[i] = (2.0 * p * (1.0 - p)).max(1e-16);
                }
                let criterion = GradientCriterion {
                    grad: &grad,
                    hess: &hess,
                    params,
                };
                trees.push(grow(&criterion, x, samples.clone(), params.max_depth, None));
            }

            for (i, row) in x.rows().enumerate() {
                for (class, tree) in trees.iter().enumerate() {
                    margins[[i, class]] += tree.leaf_value(row).first().copied().unwrap_or(0.0);
                }
            }
            rounds.push(trees);

            proba = softmax_rows(&margins);
            let loss = log_loss(&proba, y);
            debug!("[{}] train-mlogloss:{:.5}", round, loss);
            train_log_loss.push(loss);
        }

        Ok(Self {
            n_classes,
            rounds,
            train_log_loss,
        })
    }

    /// Raw per-class margins for one row.
    pub fn margins(&self, row: SparseRow<'_>) -> Array1<f64> {
        let mut margins = Array1::<f64>::zeros(self.n_classes);
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate().take(self.n_classes) {
                margins[class] += tree.leaf_value(row).first().copied().unwrap_or(0.0);
            }
        }
        margins
    }

    pub fn predict_proba_row(&self, row: SparseRow<'_>) -> Array1<f64> {
        let mut proba = self.margins(row);
        softmax_in_place(&mut proba);
        proba
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn train_log_loss(&self) -> &[f64] {
        &self.train_log_loss
    }
}

fn softmax_rows(margins: &Array2<f64>) -> Array2<f64> {
    let mut proba = margins.clone();
    for mut row in proba.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
        row.mapv_inplace(|s| (s - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    proba
}

/// Mean negative log-likelihood of the true class.
pub fn log_loss(proba: &Array2<f64>, y: &[usize]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let total: f64 = y
        .iter()
        .enumerate()
        .map(|(i, &label)| -proba[[i, label]].clamp(1e-15, 1.0).ln())
        .sum();
    total / y.len() as f64
}

impl Classify for GradientBoosting {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(&self.margins(row))
    }
}
