//! Google Generative Language embeddings provider.

use crate::embeddings::provider::{check_batch, EmbeddingProvider};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Size of `embedding-001` / `text-embedding-004` vectors.
pub const GOOGLE_DIMENSIONS: usize = 768;

/// Expected vector size for a Google embedding model.
pub fn google_dimensions(model: &str) -> usize {
    match model.trim_start_matches("models/") {
        "gemini-embedding-001" | "gemini-embedding-exp-03-07" => 3072,
        _ => GOOGLE_DIMENSIONS,
    }
}

/// Requests per `batchEmbedContents` call.
const MAX_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug)]
pub struct GoogleEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    /// Always carries the `models/` prefix
    model: String,
    dims: usize,
}

impl GoogleEmbeddings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_GOOGLE_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{}", model)
        };

        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            dims: google_dimensions(&model),
            model,
        }
    }

    fn batch_body<'a>(&'a self, texts: &'a [String]) -> BatchRequest<'a> {
        BatchRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        }
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}/{}:batchEmbedContents", self.endpoint, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.batch_body(texts))
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach Google: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Google API error {}: {}",
                status, body
            )));
        }

        let result: BatchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Google response: {}", e)))?;

        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GoogleEmbeddings {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            tracing::debug!("Embedding {} texts with {}", batch.len(), self.model);
            vectors.extend(self.embed_request(batch).await?);
        }

        check_batch("google", texts.len(), &vectors)?;
        Ok(vectors)
    }
}
