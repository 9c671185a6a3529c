use serde::{Deserialize, Serialize};

/// The six emotion categories, in canonical index order.
pub const EMOTIONS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("unknown label '{0}'")]
    UnknownName(String),
    #[error("label index {index} is outside the label set (0..{len})")]
    OutOfRange { index: i64, len: usize },
}

/// An ordered set of class names. A label's position is its numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The default six-class emotion label set.
    pub fn emotions() -> Self {
        Self::new(EMOTIONS.to_vec())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the name at `index`, if it is inside the set.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Accepts a raw integer label if it addresses a member of the set.
    pub fn check_index(&self, index: i64) -> Result<usize, LabelError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.names.len())
            .ok_or(LabelError::OutOfRange {
                index,
                len: self.names.len(),
            })
    }

    /// Resolves a raw label cell to an index.
    ///
    /// Numeric cells (`3`, or `3.0` as written by spreadsheet exports) are taken
    /// as indices; anything else is looked up by name.
    pub fn resolve(&self, raw: &str) -> Result<usize, LabelError> {
        let raw = raw.trim();
        if let Ok(index) = raw.parse::<i64>() {
            return self.check_index(index);
        }
        if let Ok(value) = raw.parse::<f64>() {
            if value.is_finite() && value.fract() == 0.0 {
                return self.check_index(value as i64);
            }
        }
        self.index_of(raw)
            .ok_or_else(|| LabelError::UnknownName(raw.to_string()))
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::emotions()
    }
}
