use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sparse::SparseMatrix;

lazy_static! {
    /// Runs of two or more word characters.
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex");
}

/// Lowercases `text` and splits it into word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// TF-IDF vectorizer with a frequency-bounded vocabulary.
///
/// - vocabulary: the `max_features` terms with the highest total count in the
///   fitting corpus (ties broken alphabetically), indexed alphabetically
/// - weights: raw term count times smoothed IDF `ln((1 + n) / (1 + df)) + 1`
/// - rows are L2-normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Builds the vocabulary and IDF table from `documents`.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        // term -> (total count, document frequency)
        let mut counts: HashMap<String, (u64, u64)> = HashMap::new();
        for doc in documents {
            let mut seen: HashMap<String, u64> = HashMap::new();
            for token in tokenize(doc.as_ref()) {
                *seen.entry(token).or_insert(0) += 1;
            }
            for (term, n) in seen {
                let entry = counts.entry(term).or_insert((0, 0));
                entry.0 += n;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(String, (u64, u64))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f64;
        self.vocabulary = BTreeMap::new();
        self.idf = Vec::with_capacity(ranked.len());
        for (index, (term, (_, df))) in ranked.into_iter().enumerate() {
            self.idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            self.vocabulary.insert(term, index);
        }
        debug!(
            "TF-IDF vocabulary fitted: {} terms from {} documents",
            self.vocabulary.len(),
            documents.len()
        );
    }

    /// Transforms each document into one L2-normalized row.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> SparseMatrix {
        let mut matrix = SparseMatrix::new(self.vocabulary.len());
        for doc in documents {
            matrix.push_row(self.weigh(doc.as_ref()));
        }
        matrix
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> SparseMatrix {
        self.fit(documents);
        self.transform(documents)
    }

    fn weigh(&self, document: &str) -> Vec<(usize, f64)> {
        let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *tf.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> = tf
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }
}
