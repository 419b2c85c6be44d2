//! OpenAI embeddings provider.

use crate::embeddings::provider::{check_batch, EmbeddingProvider};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Inputs sent per request.
const MAX_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Expected vector size for an OpenAI embedding model.
pub fn openai_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[derive(Debug)]
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_OPENAI_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            dims: openai_dimensions(&model),
            model,
        }
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let mut result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn provider_name(&self) -> &str {
        "openai"
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

        check_batch("openai", texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::test_support::{serve_json_once, vector_json};

    #[test]
    fn test_dimensions_by_model() {
        assert_eq!(openai_dimensions("text-embedding-3-small"), 1536);
        assert_eq!(openai_dimensions("text-embedding-3-large"), 3072);
        assert_eq!(openai_dimensions("text-embedding-ada-002"), 1536);
    }

    #[test]
    fn test_provider_metadata() {
        let provider = OpenAiEmbeddings::with_endpoint(
            "http://localhost:1/v1/",
            "sk",
            "text-embedding-3-large",
        );
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "text-embedding-3-large");
        assert_eq!(provider.dimensions(), 3072);
        assert_eq!(provider.endpoint, "http://localhost:1/v1");
    }

    #[test]
    fn test_response_parsing_restores_order() {
        let raw = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.25]);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider =
            OpenAiEmbeddings::with_endpoint("http://127.0.0.1:1", "sk", "text-embedding-3-small");
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_override_with_unlisted_size() {
        let body = format!(
            r#"{{"data":[{{"index":0,"embedding":{}}},{{"index":1,"embedding":{}}}]}}"#,
            vector_json(512, 0.1),
            vector_json(512, 0.2)
        );
        let endpoint = serve_json_once(body).await;
        let provider = OpenAiEmbeddings::with_endpoint(endpoint, "sk", "custom-embedding-512");
        assert_eq!(provider.dimensions(), 1536);

        let texts = vec!["one".to_string(), "two".to_string()];
        let vectors = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 512));
        assert_eq!(vectors[1][0], 0.2);
    }
}
