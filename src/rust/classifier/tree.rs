//! CART tree growing over sparse rows.
//!
//! A split sends a row left when its value in the split feature is
//! `<= threshold`. Absent entries count as zero, so for each candidate feature
//! only the node's stored entries are sorted and every zero-valued row is
//! handled as one block. Split quality comes from a [`Criterion`]: Gini for
//! classification trees, second-order gradient statistics for boosting.

use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::utils::argmax;
use super::{check_training_set, Classify, ModelKind};
use crate::error::TrainError;
use crate::features::{SparseMatrix, SparseRow};

/// Scores candidate splits from sufficient statistics of sample sets.
pub(crate) trait Criterion {
    type Stats: Clone;

    fn empty(&self) -> Self::Stats;
    fn add_sample(&self, stats: &mut Self::Stats, sample: usize);
    fn merge(&self, stats: &mut Self::Stats, other: &Self::Stats);
    fn difference(&self, total: &Self::Stats, part: &Self::Stats) -> Self::Stats;
    /// Sample weight used for the minimum child size check.
    fn weight(&self, stats: &Self::Stats) -> f64;
    fn min_child_weight(&self) -> f64;
    /// Node score; a split gains `score(left) + score(right) - score(parent)`.
    fn score(&self, stats: &Self::Stats) -> f64;
    /// Smallest gain that justifies a split.
    fn min_gain(&self) -> f64;
    fn leaf_value(&self, stats: &Self::Stats) -> Vec<f64>;

    fn stats_of(&self, samples: &[usize]) -> Self::Stats {
        let mut stats = self.empty();
        for &s in samples {
            self.add_sample(&mut stats, s);
        }
        stats
    }
}

/// Gini impurity over integer class labels.
pub(crate) struct Gini<'a> {
    pub labels: &'a [usize],
    pub n_classes: usize,
}

impl Criterion for Gini<'_> {
    type Stats = Vec<f64>;

    fn empty(&self) -> Vec<f64> {
        vec![0.0; self.n_classes]
    }

    fn add_sample(&self, stats: &mut Vec<f64>, sample: usize) {
        stats[self.labels[sample]] += 1.0;
    }

    fn merge(&self, stats: &mut Vec<f64>, other: &Vec<f64>) {
        for (a, b) in stats.iter_mut().zip(other) {
            *a += b;
        }
    }

    fn difference(&self, total: &Vec<f64>, part: &Vec<f64>) -> Vec<f64> {
        total.iter().zip(part).map(|(t, p)| t - p).collect()
    }

    fn weight(&self, stats: &Vec<f64>) -> f64 {
        stats.iter().sum()
    }

    fn min_child_weight(&self) -> f64 {
        1.0
    }

    // -n * gini(node)
    fn score(&self, stats: &Vec<f64>) -> f64 {
        let n = self.weight(stats);
        if n == 0.0 {
            return 0.0;
        }
        stats.iter().map(|c| c * c).sum::<f64>() / n - n
    }

    fn min_gain(&self) -> f64 {
        1e-12
    }

    fn leaf_value(&self, stats: &Vec<f64>) -> Vec<f64> {
        let n = self.weight(stats);
        if n == 0.0 {
            return stats.clone();
        }
        stats.iter().map(|c| c / n).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    feature: usize,
    threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// The leaf value reached by `row`.
    pub fn leaf_value(&self, row: SparseRow<'_>) -> &[f64] {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return &[],
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
                _ => 0,
            }
        }
        depth_of(&self.nodes, 0)
    }
}

/// Draws the candidate feature subset for each split.
pub(crate) struct FeatureSampler {
    rng: StdRng,
    n_features: usize,
    per_split: usize,
}

impl FeatureSampler {
    pub(crate) fn new(rng: StdRng, n_features: usize, per_split: usize) -> Self {
        Self {
            rng,
            n_features,
            per_split: per_split.clamp(1, n_features.max(1)),
        }
    }

    fn draw(&mut self) -> Vec<bool> {
        let mut mask = vec![false; self.n_features];
        if self.n_features == 0 {
            return mask;
        }
        for j in index::sample(&mut self.rng, self.n_features, self.per_split) {
            mask[j] = true;
        }
        mask
    }
}

/// Grows a tree on `samples` (row indices into `x`, repeats allowed).
pub(crate) fn grow<C: Criterion>(
    criterion: &C,
    x: &SparseMatrix,
    samples: Vec<usize>,
    max_depth: usize,
    sampler: Option<FeatureSampler>,
) -> Tree {
    let mut grower = Grower {
        criterion,
        x,
        max_depth,
        sampler,
        nodes: Vec::new(),
    };
    grower.grow_node(samples, 0);
    Tree {
        nodes: grower.nodes,
    }
}

struct Grower<'a, C: Criterion> {
    criterion: &'a C,
    x: &'a SparseMatrix,
    max_depth: usize,
    sampler: Option<FeatureSampler>,
    nodes: Vec<Node>,
}

impl<C: Criterion> Grower<'_, C> {
    fn grow_node(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let stats = self.criterion.stats_of(&samples);
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.criterion.leaf_value(&stats),
        });
        if depth >= self.max_depth || samples.len() < 2 {
            return index;
        }

        let mask = self.sampler.as_mut().map(FeatureSampler::draw);
        let split = match best_split(self.criterion, self.x, &samples, &stats, mask.as_deref()) {
            Some(split) => Some(split),
            // nothing splits on the sampled features: search all of them
            None if mask.is_some() => best_split(self.criterion, self.x, &samples, &stats, None),
            None => None,
        };
        let Some(split) = split else {
            return index;
        };

        let x = self.x;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| x.row(s).get(split.feature) <= split.threshold);
        let left = self.grow_node(left, depth + 1);
        let right = self.grow_node(right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }
}

fn best_split<C: Criterion>(
    criterion: &C,
    x: &SparseMatrix,
    samples: &[usize],
    parent: &C::Stats,
    mask: Option<&[bool]>,
) -> Option<Split> {
    let mut entries: Vec<(usize, f64, usize)> = Vec::new();
    for &s in samples {
        for (j, v) in x.row(s).iter() {
            if mask.map_or(true, |m| m.get(j).copied().unwrap_or(false)) {
                entries.push((j, v, s));
            }
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let parent_score = criterion.score(parent);
    let mut best: Option<Split> = None;
    let mut best_gain = criterion.min_gain();

    let mut start = 0;
    while start < entries.len() {
        let feature = entries[start].0;
        let end = start + entries[start..].iter().take_while(|e| e.0 == feature).count();
        let group = &entries[start..end];
        start = end;

        let mut stored = criterion.empty();
        for &(_, _, s) in group {
            criterion.add_sample(&mut stored, s);
        }
        let zeros = criterion.difference(parent, &stored);
        let zero_count = samples.len() - group.len();

        // sweep values in ascending order with the zero block at 0.0
        let mut left = criterion.empty();
        let mut left_count = 0;
        let mut zero_pending = zero_count > 0;
        let mut previous: Option<f64> = None;
        let mut i = 0;
        loop {
            let take_zeros = zero_pending && (i == group.len() || group[i].1 > 0.0);
            let value = if take_zeros {
                0.0
            } else if i < group.len() {
                group[i].1
            } else {
                break;
            };

            if let Some(prev) = previous {
                if value > prev && left_count < samples.len() {
                    let right = criterion.difference(parent, &left);
                    if criterion.weight(&left) >= criterion.min_child_weight()
                        && criterion.weight(&right) >= criterion.min_child_weight()
                    {
                        let gain =
                            criterion.score(&left) + criterion.score(&right) - parent_score;
                        if gain > best_gain {
                            best_gain = gain;
                            best = Some(Split {
                                feature,
                                threshold: prev + (value - prev) / 2.0,
                            });
                        }
                    }
                }
            }

            if take_zeros {
                criterion.merge(&mut left, &zeros);
                left_count += zero_count;
                zero_pending = false;
            } else {
                criterion.add_sample(&mut left, group[i].2);
                left_count += 1;
                i += 1;
            }
            previous = Some(value);
        }
    }

    best
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

/// A single CART classification tree; leaves hold class frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_classes: usize,
    tree: Tree,
}

impl DecisionTree {
    pub fn fit(
        params: &TreeParams,
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
    ) -> Result<Self, TrainError> {
        check_training_set(ModelKind::DecisionTree, x, y, n_classes)?;
        Ok(Self::grow(x, y, n_classes, (0..x.n_rows()).collect(), params.max_depth, None))
    }

    pub(crate) fn grow(
        x: &SparseMatrix,
        y: &[usize],
        n_classes: usize,
        samples: Vec<usize>,
        max_depth: usize,
        sampler: Option<FeatureSampler>,
    ) -> Self {
        let criterion = Gini {
            labels: y,
            n_classes,
        };
        Self {
            n_classes,
            tree: grow(&criterion, x, samples, max_depth, sampler),
        }
    }

    /// Class frequencies of the leaf reached by `row`.
    pub fn predict_proba_row(&self, row: SparseRow<'_>) -> &[f64] {
        self.tree.leaf_value(row)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

impl Classify for DecisionTree {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_row(&self, row: SparseRow<'_>) -> usize {
        argmax(self.predict_proba_row(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::toy_problem;

    #[test]
    fn test_fits_toy_problem() {
        let (x, y) = toy_problem();
        let model = DecisionTree::fit(&TreeParams::default(), &x, &y, 3).unwrap();
        assert_eq!(model.predict(&x), y);
        assert!(model.tree().depth() <= 10);
    }

    #[test]
    fn test_depth_limit() {
        let (x, y) = toy_problem();
        let stump = DecisionTree::fit(&TreeParams { max_depth: 1 }, &x, &y, 3).unwrap();
        assert_eq!(stump.tree().depth(), 1);
        assert_eq!(stump.tree().n_nodes(), 3);

        let leaf = DecisionTree::fit(&TreeParams { max_depth: 0 }, &x, &y, 3).unwrap();
        assert_eq!(leaf.tree().n_nodes(), 1);
        let proba = leaf.predict_proba_row(x.row(0));
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pure_node_is_a_leaf() {
        let mut x = SparseMatrix::new(2);
        x.push_row(vec![(0, 1.0)]);
        x.push_row(vec![(1, 1.0)]);
        let model = DecisionTree::fit(&TreeParams::default(), &x, &[2, 2], 3).unwrap();
        assert_eq!(model.tree().n_nodes(), 1);
        assert_eq!(model.predict_proba_row(x.row(0)), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_split_threshold_between_zero_and_value() {
        let mut x = SparseMatrix::new(1);
        x.push_row(vec![(0, 0.8)]);
        x.push_row(Vec::new());
        let model = DecisionTree::fit(&TreeParams::default(), &x, &[1, 0], 2).unwrap();
        match &model.tree().nodes[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert!((threshold - 0.4).abs() < 1e-12);
            }
            other => panic!("expected a split, got {:?}", other),
        }
    }
}
