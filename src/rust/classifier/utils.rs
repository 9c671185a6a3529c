use ndarray::{Array1, Array2};

use crate::features::SparseRow;

/// Index of the largest score; the first one wins on ties.
pub(crate) fn argmax<'a>(scores: impl IntoIterator<Item = &'a f64>) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, &score) in scores.into_iter().enumerate() {
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

pub(crate) fn softmax_in_place(scores: &mut Array1<f64>) {
    let max = scores.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
    scores.mapv_inplace(|s| (s - max).exp());
    let sum = scores.sum();
    if sum > 0.0 {
        *scores /= sum;
    }
}

/// `intercept + row · weights` for a `(n_features, n_classes)` weight matrix.
pub(crate) fn class_scores(
    row: SparseRow<'_>,
    weights: &Array2<f64>,
    intercept: &Array1<f64>,
) -> Array1<f64> {
    let mut scores = intercept.clone();
    for (j, v) in row.iter().filter(|&(j, _)| j < weights.nrows()) {
        scores.scaled_add(v, &weights.row(j));
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SparseMatrix;
    use ndarray::array;

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[] as &[f64]), 0);
    }

    #[test]
    fn test_softmax() {
        let mut scores = array![1000.0, 1000.0];
        softmax_in_place(&mut scores);
        assert!((scores[0] - 0.5).abs() < 1e-12);
        assert!((scores.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_scores_ignores_unknown_columns() {
        let mut m = SparseMatrix::new(3);
        m.push_row(vec![(0, 1.0), (2, 5.0)]);
        let weights = array![[1.0, 0.0], [0.0, 1.0]];
        let intercept = array![0.5, -0.5];
        let scores = class_scores(m.row(0), &weights, &intercept);
        assert_eq!(scores, array![1.5, -0.5]);
    }
}
