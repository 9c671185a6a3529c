use std::path::Path;

use crate::error::DatasetError;
use crate::labels::LabelSet;

use super::Example;

const TEXT_COLUMN: &str = "text";
const LABEL_COLUMN: &str = "label";

/// Reads a headed CSV with `text` and `label` columns; other columns are
/// ignored. Labels may be names or indices.
pub fn read_csv(path: &Path, labels: &LabelSet) -> Result<Vec<Example>, DatasetError> {
    let csv_error = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(DatasetError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let text_at = column(TEXT_COLUMN)?;
    let label_at = column(LABEL_COLUMN)?;

    let mut examples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let text = record.get(text_at).unwrap_or_default().to_string();
        let label = labels
            .resolve(record.get(label_at).unwrap_or_default())
            .map_err(|source| DatasetError::Label {
                row: row + 1,
                source,
            })?;
        examples.push(Example { text, label });
    }
    Ok(examples)
}
