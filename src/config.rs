//! Runtime configuration utilities for review-insights.

use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::anyhow;

use crate::genai::retry::RetryPolicy;

pub const INPUT_FILE: &str = "reviews_with_sentiment.csv";
pub const SUMMARY_JSON_FILE: &str = "topic_summaries.json";
pub const SUMMARY_CSV_FILE: &str = "reviews_with_summaries.csv";
pub const INDEX_FILE: &str = "review_index.bin";
pub const EMBEDDINGS_FILE: &str = "review_embeddings.bin";
pub const METADATA_FILE: &str = "review_metadata.csv";
pub const MANIFEST_FILE: &str = "review_index.manifest.json";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Which embedding model turns review text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmbeddingBackend {
    /// Lexical feature hashing (default). Matches shared words, not meaning; no model download or network.
    Hashing,
    /// Local MiniLM sentence embeddings (requires the `embeddings` feature).
    Fastembed,
    /// Gemini `batchEmbedContents`.
    Gemini,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::Fastembed => "fastembed",
            Self::Gemini => "gemini",
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "fastembed" => Ok(Self::Fastembed),
            "gemini" => Ok(Self::Gemini),
            other => Err(anyhow!("unknown embedding backend `{other}`")),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration resolved from `.env` and defaults.
#[derive(Clone)]
pub struct Settings {
    /// Folder holding the input dataset and every derived artefact.
    pub data_dir: PathBuf,
    /// Gemini API key; only needed by commands that call the service.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_embedding_model: String,
    pub gemini_base_url: String,
    /// Reviews per topic embedded in a summary prompt.
    pub summary_max_samples: usize,
    /// Topic summaries requested at once.
    pub summary_concurrency: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub embedding_backend: EmbeddingBackend,
    /// Output dimension of the hashing backend.
    pub embedding_dim: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/sample"),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_embedding_model: "text-embedding-004".to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            summary_max_samples: 50,
            summary_concurrency: 1,
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            embedding_backend: EmbeddingBackend::Hashing,
            embedding_dim: 384,
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let gemini_model = env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model);
        let gemini_embedding_model =
            env::var("GEMINI_EMBEDDING_MODEL").unwrap_or(defaults.gemini_embedding_model);
        let gemini_base_url = env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url);
        let summary_max_samples = parsed("SUMMARY_MAX_SAMPLES").unwrap_or(50);
        let summary_concurrency = parsed::<usize>("SUMMARY_CONCURRENCY")
            .unwrap_or(1)
            .max(1);
        let request_timeout = Duration::from_secs(parsed("REQUEST_TIMEOUT_SECS").unwrap_or(60));
        let retry = RetryPolicy::new(
            parsed("RETRY_MAX_ATTEMPTS").unwrap_or(defaults.retry.max_attempts),
            parsed("RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.base_delay),
            parsed("RETRY_MAX_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.max_delay),
        );
        let embedding_backend = match env::var("EMBEDDING_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.embedding_backend,
        };
        let embedding_dim = parsed("EMBEDDING_DIM").unwrap_or(defaults.embedding_dim);

        Ok(Self {
            data_dir,
            gemini_api_key,
            gemini_model,
            gemini_embedding_model,
            gemini_base_url,
            summary_max_samples,
            summary_concurrency,
            request_timeout,
            retry,
            embedding_backend,
            embedding_dim,
        })
    }

    /// Settings rooted at `data_dir`, everything else defaulted.
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Paths of the persisted index bundle.
    pub fn index_paths(&self) -> crate::index::persist::BundlePaths {
        crate::index::persist::BundlePaths {
            index: self.join_data(INDEX_FILE),
            embeddings: self.join_data(EMBEDDINGS_FILE),
            metadata: self.join_data(METADATA_FILE),
            manifest: self.join_data(MANIFEST_FILE),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("data_dir", &self.data_dir)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_embedding_model", &self.gemini_embedding_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("summary_max_samples", &self.summary_max_samples)
            .field("summary_concurrency", &self.summary_concurrency)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("embedding_backend", &self.embedding_backend)
            .field("embedding_dim", &self.embedding_dim)
            .finish()
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_api_key() {
        let settings = Settings {
            gemini_api_key: Some("super-secret".into()),
            ..Settings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!(
            "Gemini".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::Gemini
        );
        assert!("faiss".parse::<EmbeddingBackend>().is_err());
    }
}
