//! Offline echo model.
//!
//! Needs no network or credentials. It reads the rendered prompt back into
//! its sections and answers deterministically, which makes the whole chat
//! pipeline runnable offline.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::AppResult;
use docqa_prompt::{PromptSections, OUT_OF_CONTEXT_ANSWER};

pub const DEFAULT_ECHO_MODEL: &str = "fake-local";

const PREVIEW_CHARS: usize = 180;

/// Deterministic local stand-in for a language model.
#[derive(Debug, Clone, Default)]
pub struct EchoClient;

impl EchoClient {
    pub fn new() -> Self {
        Self
    }

    /// Answer for a rendered prompt.
    pub fn respond(prompt: &str) -> String {
        let sections = PromptSections::parse(prompt);
        if sections.has_no_context() {
            return OUT_OF_CONTEXT_ANSWER.to_string();
        }

        let question = if sections.question.is_empty() {
            "No question provided."
        } else {
            sections.question.as_str()
        };

        let preview: String = sections
            .context
            .chars()
            .take(PREVIEW_CHARS)
            .collect::<String>()
            .replace('\n', " ");

        format!("(Offline simulation) {} | Context: {}...", question, preview)
            .trim()
            .to_string()
    }
}

#[async_trait::async_trait]
impl LlmClient for EchoClient {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: Self::respond(&request.prompt),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
