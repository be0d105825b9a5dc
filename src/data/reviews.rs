//! Loading the labelled review dataset.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::error::{PipelineError, Result};

pub const TEXT_COLUMN: &str = "review_text";
pub const TOPIC_COLUMN: &str = "topic";
pub const SENTIMENT_COLUMN: &str = "sentiment";
pub const SUMMARY_COLUMN: &str = "topic_summary";

/// One labelled review, borrowed from its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Review<'a> {
    /// Row position within the dataset.
    pub id: usize,
    pub text: &'a str,
    pub topic: &'a str,
    pub sentiment: &'a str,
}

/// The tabular dataset with every original column preserved.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl ReviewTable {
    /// Read a CSV dataset. A missing file is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        info!(path = %path.display(), rows = rows.len(), "loaded reviews");
        Ok(Self::from_parts(path, headers, rows))
    }

    /// Build a table from in-memory records; used by tests and tooling.
    pub fn from_parts<P: Into<PathBuf>>(
        path: P,
        headers: StringRecord,
        rows: Vec<StringRecord>,
    ) -> Self {
        Self {
            path: path.into(),
            headers,
            rows,
        }
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Position of a column the caller cannot proceed without.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Values of one column, one per row. Short rows yield empty strings.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| row.get(idx).unwrap_or("")).collect())
    }

    /// Every row as a [`Review`]; requires text, topic and sentiment columns.
    pub fn reviews(&self) -> Result<Vec<Review<'_>>> {
        let text = self.require_column(TEXT_COLUMN)?;
        let topic = self.require_column(TOPIC_COLUMN)?;
        let sentiment = self.require_column(SENTIMENT_COLUMN)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(id, row)| Review {
                id,
                text: row.get(text).unwrap_or(""),
                topic: row.get(topic).unwrap_or(""),
                sentiment: row.get(sentiment).unwrap_or(""),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("reviews.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReviewTable::load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn short_rows_read_as_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "review_id,review_text,topic,sentiment\n1,great phone,0,positive\n2\n",
        );
        let table = ReviewTable::load(&path).unwrap();
        let reviews = table.reviews().unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].text, "");
        assert_eq!(reviews[1].topic, "");
        assert_eq!(reviews[1].id, 1);
    }

    #[test]
    fn missing_sentiment_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "review_text,topic\nok,1\n");
        let table = ReviewTable::load(&path).unwrap();
        match table.reviews().unwrap_err() {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "sentiment"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
