use std::path::Path;

use tracing::info;

use crate::error::UpdaterError;

/// Names of the two required input columns. Defaults match the spreadsheet
/// exports this tool is usually fed.
#[derive(Debug, Clone)]
pub struct ColumnNames {
    pub doi: String,
    pub topics: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            doi: "DOI".to_string(),
            topics: "FINAL TRIPLETS".to_string(),
        }
    }
}

/// One input record, immutable once read. The DOI and classification cells
/// are kept raw; validation happens per row in the pipeline so a bad cell
/// is reported instead of aborting the read.
#[derive(Debug, Clone)]
pub struct InputRow {
    pub dataset_id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub doi: String,
    pub topics: String,
}

/// Reads the input file into rows, preserving file order. Fails when the
/// file cannot be read or either required column is missing.
pub fn read_rows(path: &Path, columns: &ColumnNames) -> Result<Vec<InputRow>, UpdaterError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| UpdaterError::InputRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let headers = reader
        .headers()
        .map_err(|err| UpdaterError::InputRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
        .clone();

    let position = |name: &str| headers.iter().position(|header| header == name);
    let doi_index =
        position(&columns.doi).ok_or_else(|| UpdaterError::MissingColumn(columns.doi.clone()))?;
    let topics_index = position(&columns.topics)
        .ok_or_else(|| UpdaterError::MissingColumn(columns.topics.clone()))?;
    let id_index = position("dataset_id");
    let title_index = position("dataset_title");
    let url_index = position("URL");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| UpdaterError::InputRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let cell = |index: Option<usize>| {
            index
                .and_then(|index| record.get(index))
                .map(|value| value.to_string())
        };
        rows.push(InputRow {
            dataset_id: cell(id_index),
            title: cell(title_index),
            url: cell(url_index),
            doi: cell(Some(doi_index)).unwrap_or_default(),
            topics: cell(Some(topics_index)).unwrap_or_default(),
        });
    }

    info!(path = %path.display(), rows = rows.len(), "read input file");
    Ok(rows)
}
