//! Gemini REST client for text generation and batch embeddings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{config::Settings, error::ServiceError, genai::GenerativeService};

/// Upper bound on texts per `batchEmbedContents` request.
pub const EMBED_BATCH_LIMIT: usize = 100;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin client over the Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        embedding_model: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .user_agent("review-insights/0.1")
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|err| ServiceError::Permanent(format!("building http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: bare_model(model).to_string(),
            embedding_model: bare_model(embedding_model).to_string(),
        })
    }

    /// Build a client from settings; `None` when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>, ServiceError> {
        let Some(api_key) = settings.gemini_api_key.as_deref() else {
            return Ok(None);
        };
        Self::new(
            &settings.gemini_base_url,
            api_key,
            &settings.gemini_model,
            &settings.gemini_embedding_model,
            settings.request_timeout,
        )
        .map(Some)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, &detail));
        }
        response
            .json::<R>()
            .await
            .map_err(|err| ServiceError::Permanent(format!("decoding response: {err}")))
    }

    /// Embed up to [`EMBED_BATCH_LIMIT`] texts in one request.
    #[instrument(skip_all, fields(batch = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = format!("models/{}", self.embedding_model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &model,
                    content: Content::text(text),
                })
                .collect(),
        };
        let url = self.endpoint(&self.embedding_model, "batchEmbedContents");
        let response: BatchEmbedResponse = self.post(&url, &request).await?;
        if response.embeddings.len() != texts.len() {
            return Err(ServiceError::Permanent(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>, ServiceError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generateContent");
        let request = GenerateRequest {
            contents: vec![Content::text(prompt)],
        };
        let url = self.endpoint(&self.model, "generateContent");
        let response: GenerateResponse = self.post(&url, &request).await?;
        Ok(response.text())
    }
}

fn bare_model(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_builder() {
        ServiceError::Permanent(format!("invalid request: {err}"))
    } else {
        ServiceError::Transient(format!("request failed: {err}"))
    }
}

/// Throttling and server faults are worth retrying; other statuses are not.
pub fn status_error(status: StatusCode, detail: &str) -> ServiceError {
    let message = format!("HTTP {}: {}", status.as_u16(), detail.trim());
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        ServiceError::Transient(message)
    } else {
        ServiceError::Permanent(message)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![RequestPart { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate, if any.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}
