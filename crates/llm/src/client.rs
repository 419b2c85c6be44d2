//! LLM client abstraction and request/response types.

use docqa_core::AppResult;
use std::sync::Arc;

/// LLM completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The prompt text to send to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "gpt-5-nano", "gemini-2.5-flash-lite")
    pub model: String,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// LLM completion response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for LLM providers.
///
/// Every backend (cloud or offline) is a peer implementation of this trait.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "openai", "google", "fake").
    fn provider_name(&self) -> &str;

    /// Perform a single completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

/// A resolved language-model backend: provider, model and client.
///
/// Resolved once per chat session and reused for every turn.
#[derive(Clone)]
pub struct ChatBackend {
    pub provider: String,
    pub model: String,
    pub client: Arc<dyn LlmClient>,
}

impl ChatBackend {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        client: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            client,
        }
    }

    /// Send `prompt` at temperature 0 and return the trimmed answer text.
    pub async fn invoke(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.0);
        let response = self.client.complete(&request).await?;

        tracing::debug!(
            provider = %self.provider,
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Completion received"
        );

        Ok(response.content.trim().to_string())
    }
}

impl std::fmt::Debug for ChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBackend")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingClient {
        seen: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: "  padded answer \n".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(3, 2),
            })
        }
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Hello", "gpt-5-nano").with_temperature(0.0);
        assert_eq!(request.model, "gpt-5-nano");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[test]
    fn test_usage_totals() {
        assert_eq!(LlmUsage::new(10, 5).total_tokens, 15);
    }

    #[tokio::test]
    async fn test_invoke_uses_zero_temperature_and_trims() {
        let client = Arc::new(RecordingClient {
            seen: Mutex::new(Vec::new()),
        });
        let backend = ChatBackend::new("recording", "model-x", client.clone());

        let answer = backend.invoke("prompt text").await.unwrap();
        assert_eq!(answer, "padded answer");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].model, "model-x");
        assert_eq!(seen[0].prompt, "prompt text");
    }
}
