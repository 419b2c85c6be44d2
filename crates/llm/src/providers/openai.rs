//! OpenAI chat completions provider.
//!
//! API: https://platform.openai.com/docs/api-reference/chat

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    /// Null for some reasoning models
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenAI LLM client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_ENDPOINT, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        // Reasoning models reject any temperature other than the default
        let temperature = if supports_temperature(&request.model) {
            request.temperature
        } else {
            None
        };

        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature,
        }
    }
}

fn supports_temperature(model: &str) -> bool {
    let model = model.to_lowercase();
    !(model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4"))
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to OpenAI");

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, message
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Llm("OpenAI returned no completion choices".to_string()))?;

        let usage = chat
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: chat.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::with_base_url("http://localhost:9999/v1/", "sk-test");
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_temperature_dropped_for_reasoning_models() {
        let client = OpenAiClient::new("sk-test");

        let request = LlmRequest::new("Hi", "gpt-5-nano").with_temperature(0.0);
        assert_eq!(client.to_chat_request(&request).temperature, None);

        let request = LlmRequest::new("Hi", "gpt-4o-mini").with_temperature(0.0);
        assert_eq!(client.to_chat_request(&request).temperature, Some(0.0));
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAiClient::new("sk-test");
        let request = LlmRequest::new("Hello", "gpt-5-nano").with_temperature(0.0);
        let body = serde_json::to_value(client.to_chat_request(&request)).unwrap();

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["model"], "gpt-5-nano");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = serde_json::json!({
            "model": "gpt-5-nano",
            "choices": [{"message": {"content": "Two years."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Two years."));
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 12);
    }
}
