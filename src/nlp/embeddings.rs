//! Embedding backends and the order-preserving embedding pipeline.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

#[cfg(feature = "embeddings")]
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{
    config::{EmbeddingBackend, Settings},
    data::reviews::{ReviewTable, TEXT_COLUMN},
    error::{PipelineError, Result},
    genai::{
        gemini::{GeminiClient, EMBED_BATCH_LIMIT},
        retry::RetryPolicy,
    },
};

/// A model mapping texts to fixed-length vectors, one per input.
#[async_trait]
pub trait Embedder: Send {
    /// Stable backend name recorded alongside persisted vectors.
    fn name(&self) -> &'static str;

    async fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Review text column with absent values coerced to empty strings.
pub fn review_texts(table: &ReviewTable) -> Result<Vec<String>> {
    Ok(table
        .column(TEXT_COLUMN)?
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Embed `texts` in one backend call; the output is aligned with the input.
#[instrument(skip_all, fields(backend = embedder.name(), rows = texts.len()))]
pub async fn embed(embedder: &mut dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let vectors = embedder.encode(texts).await?;
    if vectors.len() != texts.len() {
        return Err(PipelineError::Embedding(format!(
            "{} returned {} vectors for {} texts",
            embedder.name(),
            vectors.len(),
            texts.len()
        )));
    }
    info!(
        rows = vectors.len(),
        dim = vectors.first().map(Vec::len).unwrap_or(0),
        "computed embeddings"
    );
    Ok(vectors)
}

/// Instantiate the configured backend.
pub fn embedder_for(backend: EmbeddingBackend, settings: &Settings) -> Result<Box<dyn Embedder>> {
    match backend {
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(settings.embedding_dim))),
        EmbeddingBackend::Gemini => {
            let client = GeminiClient::from_settings(settings)?.ok_or(PipelineError::MissingApiKey)?;
            Ok(Box::new(GeminiEmbedder::new(client, settings.retry)))
        }
        #[cfg(feature = "embeddings")]
        EmbeddingBackend::Fastembed => Ok(Box::new(FastEmbedder::new()?)),
        #[cfg(not(feature = "embeddings"))]
        EmbeddingBackend::Fastembed => Err(PipelineError::Embedding(
            "fastembed backend requires building with the `embeddings` feature".into(),
        )),
    }
}

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

/// Signed feature hashing of word tokens, L2-normalised.
///
/// Deterministic across runs and platforms; texts sharing vocabulary land
/// close together, which is enough for keyword-flavoured retrieval without
/// a model download.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();
        for token in TOKEN.find_iter(&lower) {
            let digest = Sha256::digest(token.as_str().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let hash = u64::from_le_bytes(bytes);
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &'static str {
        "hashing"
    }

    async fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Gemini embeddings, requested in chunks of [`EMBED_BATCH_LIMIT`].
pub struct GeminiEmbedder {
    client: GeminiClient,
    retry: RetryPolicy,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_LIMIT) {
            let batch = self
                .retry
                .run("batch_embed_contents", || self.client.embed_batch(chunk))
                .await?;
            vectors.extend(batch);
        }
        Ok(vectors)
    }
}

/// Local MiniLM sentence embeddings.
#[cfg(feature = "embeddings")]
pub struct FastEmbedder {
    model: TextEmbedding,
}

#[cfg(feature = "embeddings")]
impl FastEmbedder {
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;
        Ok(Self { model })
    }
}

#[cfg(feature = "embeddings")]
#[async_trait]
impl Embedder for FastEmbedder {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    async fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let documents: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.model
            .embed(documents, None)
            .map_err(|err| PipelineError::Embedding(err.to_string()))
    }
}
