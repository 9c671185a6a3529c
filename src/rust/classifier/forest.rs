use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, FeatureSampler};
use super::utils::argmax;
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 20,
            max_depth: 10,
        }
    }
}

/// Bagged Gini trees with `sqrt(n_features)` candidate features per split.
/// Predictions average the trees' leaf class frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        params: &ForestParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
        seed: u64,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::RandomForest, x, y, n_classes)?;

        let n = x.n_rows();
        let per_split = (x.n_cols() as f64).sqrt() as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..params.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let sampler =
                    FeatureSampler::new(StdRng::seed_from_u64(rng.gen()), x.n_cols(), per_split);
                DecisionTree::grow(x, y, n_classes, bootstrap, params.max_depth, Some(sampler))
            })
            .collect();

        Ok(Self { n_classes, trees })
    }

    /// Mean class frequencies over all trees.
    pub fn predict_proba_row(&self, row: SparseRow<'_>) -> Array1<f64> {
        let mut proba = Array1::<f64>::zeros(self.n_classes);
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict_proba_row(row)) {
                *p += v;
            }
        }
        if !self.trees.is_empty() {
            proba /= self.trees.len() as f64;
        }
        proba
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classify for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(&self.predict_proba_row(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::toy_problem;

    #[test]
    fn test_fits_toy_problem() {
        let (x, y) = toy_problem();
        let model = RandomForest::fit(&ForestParams::default(), &x, &y, 3, 42).unwrap();
        assert_eq!(model.n_trees(), 20);
        assert!(model.score(&x, &y) >= 0.9);
    }

    #[test]
    fn test_seeded_forest_is_reproducible() {
        let (x, y) = toy_problem();
        let params = ForestParams {
            n_trees: 5,
            max_depth: 3,
        };
        let a = RandomForest::fit(&params, &x, &y, 3, 1).unwrap();
        let b = RandomForest::fit(&params, &x, &y, 3, 1).unwrap();
        assert_eq!(a, b);
    }
}
