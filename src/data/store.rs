//! Persistence of topic summaries and the summary-augmented dataset.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use csv::StringRecord;
use indexmap::IndexMap;
use tracing::info;

use crate::{
    config::{Settings, SUMMARY_CSV_FILE, SUMMARY_JSON_FILE},
    data::reviews::{ReviewTable, SUMMARY_COLUMN, TOPIC_COLUMN},
    error::{PipelineError, Result},
};

/// Topic label → summary text, in topic first-appearance order.
pub type TopicSummaries = IndexMap<String, String>;

/// Fixed output locations of the summary pipeline.
#[derive(Debug, Clone)]
pub struct SummaryPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl SummaryPaths {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            json: settings.join_data(SUMMARY_JSON_FILE),
            csv: settings.join_data(SUMMARY_CSV_FILE),
        }
    }
}

/// Write the summary document and the augmented dataset, overwriting both.
///
/// Every row is resolved before anything touches disk, so a topic without
/// a summary leaves prior outputs intact.
pub fn persist(
    summaries: &TopicSummaries,
    table: &ReviewTable,
    paths: &SummaryPaths,
) -> Result<(PathBuf, PathBuf)> {
    let (headers, rows) = augment(summaries, table)?;

    write_json(summaries, &paths.json)?;
    info!(path = %paths.json.display(), topics = summaries.len(), "saved topic summaries");

    ensure_parent(&paths.csv)?;
    let mut writer = csv::Writer::from_path(&paths.csv)?;
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!(path = %paths.csv.display(), rows = rows.len(), "saved augmented dataset");

    Ok((paths.json.clone(), paths.csv.clone()))
}

/// Attach `topic_summary` to every row by looking up the row's topic.
///
/// An existing `topic_summary` column is overwritten in place.
pub fn augment(
    summaries: &TopicSummaries,
    table: &ReviewTable,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let topic_idx = table.require_column(TOPIC_COLUMN)?;
    let existing = table.column_index(SUMMARY_COLUMN);

    let mut headers = table.headers().clone();
    if existing.is_none() {
        headers.push_field(SUMMARY_COLUMN);
    }
    let width = headers.len();

    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        let topic = row.get(topic_idx).unwrap_or("");
        let summary = summaries
            .get(topic)
            .ok_or_else(|| PipelineError::MissingSummary {
                topic: topic.to_string(),
            })?;
        let mut out = StringRecord::with_capacity(row.as_slice().len() + summary.len(), width);
        for idx in 0..width {
            if Some(idx) == existing || (existing.is_none() && idx == width - 1) {
                out.push_field(summary);
            } else {
                out.push_field(row.get(idx).unwrap_or(""));
            }
        }
        rows.push(out);
    }
    Ok((headers, rows))
}

fn write_json(summaries: &TopicSummaries, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summaries)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read a previously persisted summary document.
pub fn load_summaries(path: &Path) -> Result<TopicSummaries> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub(crate) fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(with_summary: bool) -> ReviewTable {
        let mut headers = vec!["review_id", "review_text", "topic", "sentiment"];
        if with_summary {
            headers.push("topic_summary");
        }
        let rows = [("1", "a", "A"), ("2", "b", "B"), ("3", "c", "A")]
            .iter()
            .map(|(id, text, topic)| {
                let mut fields = vec![*id, *text, *topic, "positive"];
                if with_summary {
                    fields.push("stale");
                }
                StringRecord::from(fields)
            })
            .collect();
        ReviewTable::from_parts("mem.csv", StringRecord::from(headers), rows)
    }

    fn summaries() -> TopicSummaries {
        IndexMap::from([
            ("A".to_string(), "about A".to_string()),
            ("B".to_string(), "about B".to_string()),
        ])
    }

    #[test]
    fn appends_summary_column() {
        let (headers, rows) = augment(&summaries(), &table(false)).unwrap();
        assert_eq!(headers.get(4), Some("topic_summary"));
        assert_eq!(rows[0].get(4), Some("about A"));
        assert_eq!(rows[1].get(4), Some("about B"));
        assert_eq!(rows[2].get(4), Some("about A"));
    }

    #[test]
    fn replaces_existing_summary_column() {
        let (headers, rows) = augment(&summaries(), &table(true)).unwrap();
        assert_eq!(headers.len(), 5);
        assert!(rows.iter().all(|r| r.get(4) != Some("stale")));
    }

    #[test]
    fn unknown_topic_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SummaryPaths {
            json: dir.path().join("out/summaries.json"),
            csv: dir.path().join("out/augmented.csv"),
        };
        let partial = IndexMap::from([("A".to_string(), "about A".to_string())]);
        let err = persist(&partial, &table(false), &paths).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSummary { ref topic } if topic == "B"));
        assert!(!paths.json.exists());
        assert!(!paths.csv.exists());
    }
}
