use crate::config::Config;
use crate::corpus_manager::{CorpusError, CorpusInfo, CorpusManager};
use crate::error::DatasetError;

use super::Example;

/// Downloads (or reuses) the reference corpus and validates its labels.
pub async fn load_reference(config: &Config) -> Result<Vec<Example>, DatasetError> {
    let manager = CorpusManager::new(&config.cache_dir, CorpusInfo::reference())
        .map_err(CorpusError::from)?;
    manager.ensure_corpus_downloaded().await?;

    manager
        .read_corpus()?
        .into_iter()
        .enumerate()
        .map(|(row, r)| {
            let label = config
                .labels
                .check_index(r.label)
                .map_err(|source| DatasetError::Label {
                    row: row + 1,
                    source,
                })?;
            Ok(Example {
                text: r.text,
                label,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus_manager::CorpusRow;
    use crate::labels::LabelError;

    #[test]
    fn test_reads_cached_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_cache_dir(dir.path());
        let manager = CorpusManager::new(dir.path(), CorpusInfo::reference()).unwrap();
        manager
            .store_corpus(&[CorpusRow {
                text: "i feel so loved".to_string(),
                label: 2,
            }])
            .unwrap();

        let examples = tokio_test::block_on(load_reference(&config)).unwrap();
        assert_eq!(examples, vec![Example::new("i feel so loved", 2)]);
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_cache_dir(dir.path());
        let manager = CorpusManager::new(dir.path(), CorpusInfo::reference()).unwrap();
        manager
            .store_corpus(&[CorpusRow {
                text: "???".to_string(),
                label: 9,
            }])
            .unwrap();

        let err = tokio_test::block_on(load_reference(&config)).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Label {
                row: 1,
                source: LabelError::OutOfRange { index: 9, .. }
            }
        ));
    }
}
