//! Error taxonomy shared by the summarisation and indexing pipelines.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required upstream artefact is absent.
    #[error("missing input file {path}; run the upstream step first")]
    MissingInput { path: PathBuf },

    /// The dataset lacks a column the pipeline cannot proceed without.
    #[error("input {path} has no `{column}` column")]
    MissingColumn { column: String, path: PathBuf },

    /// A topic present in the dataset has no summary entry.
    #[error("no summary recorded for topic `{topic}`")]
    MissingSummary { topic: String },

    /// The embedding backend failed or broke positional alignment.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The generative service is required but not configured.
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by an external generative or embedding service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Network failures, timeouts, throttling and server-side errors.
    #[error("transient service error: {0}")]
    Transient(String),
    /// Rejected or undecodable requests; retrying cannot help.
    #[error("permanent service error: {0}")]
    Permanent(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors raised while building, persisting or reloading the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from zero vectors")]
    EmptyDataset,

    #[error("vector {row} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("persisted artefacts disagree: {0}")]
    AlignmentMismatch(String),

    #[error("checksum mismatch for {path}")]
    ChecksumMismatch { path: PathBuf },

    #[error("{path} is not a review index file")]
    BadFormat { path: PathBuf },

    #[error("binary encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
