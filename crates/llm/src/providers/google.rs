//! Google Generative Language (Gemini) provider.
//!
//! API: https://ai.google.dev/api/generate-content

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini LLM client.
pub struct GoogleClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GOOGLE_ENDPOINT, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_generate_request(&self, request: &LlmRequest) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GoogleClient {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Google");

        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_path(&request.model)
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Google: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Google API error ({}): {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Google response: {}", e)))?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Google returned no candidates".to_string()))?;

        let content: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();

        let usage = generated
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path() {
        assert_eq!(
            GoogleClient::model_path("gemini-2.5-flash-lite"),
            "models/gemini-2.5-flash-lite"
        );
        assert_eq!(GoogleClient::model_path("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn test_request_body_shape() {
        let client = GoogleClient::new("g-key");
        let request = LlmRequest::new("Hello", "gemini-2.5-flash-lite").with_temperature(0.0);
        let body = serde_json::to_value(client.to_generate_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_response_parts_are_concatenated() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Two "}, {"text": "years."}]}
            }],
            "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 2}
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "Two years.");
        assert_eq!(parsed.usage_metadata.unwrap().candidates_token_count, 2);
    }
}
