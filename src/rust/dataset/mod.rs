//! Training examples from a local CSV file or the reference corpus.

use std::path::PathBuf;

use log::info;

use crate::config::Config;
use crate::error::DatasetError;

mod local;
mod reference;

pub use local::read_csv;
pub use reference::load_reference;

/// One labeled text; `label` indexes the configured label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub text: String,
    pub label: usize,
}

impl Example {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Where training examples come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    LocalCsv(PathBuf),
    ReferenceCorpus,
}

impl DataSource {
    /// The configured CSV if it exists, otherwise the reference corpus.
    pub fn resolve(config: &Config) -> Self {
        if config.dataset_path.is_file() {
            DataSource::LocalCsv(config.dataset_path.clone())
        } else {
            DataSource::ReferenceCorpus
        }
    }
}

pub async fn load_examples(config: &Config) -> Result<Vec<Example>, DatasetError> {
    let examples = match DataSource::resolve(config) {
        DataSource::LocalCsv(path) => {
            info!("Loading dataset from {:?}", path);
            read_csv(&path, &config.labels)?
        }
        DataSource::ReferenceCorpus => {
            info!(
                "No dataset at {:?}, using the reference corpus",
                config.dataset_path
            );
            load_reference(config).await?
        }
    };
    info!("Loaded {} examples", examples.len());
    Ok(examples)
}
