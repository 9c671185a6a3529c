//! Text to sparse feature vectors.

pub mod sparse;
pub mod tfidf;

pub use sparse::{SparseMatrix, SparseRow};
pub use tfidf::{tokenize, TfidfVectorizer};
