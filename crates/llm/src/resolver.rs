//! Language-model backend resolution.
//!
//! Candidates are tried strictly in order and the first one that can be
//! constructed wins. Each failed candidate leaves a reason in the
//! diagnostics so the final error can explain every attempt.

use crate::client::{ChatBackend, LlmClient};
use crate::providers::{EchoClient, GoogleClient, OpenAiClient};
use docqa_core::{
    AppError, AppResult, ProviderDiagnostics, ProviderKind, ProviderRegistry, Settings,
};
use std::sync::Arc;

pub const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-5-nano";
pub const DEFAULT_GOOGLE_CHAT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_OFFLINE_CHAT_MODEL: &str = crate::providers::echo::DEFAULT_ECHO_MODEL;

/// Result of trying one candidate.
#[derive(Debug)]
pub enum CandidateOutcome {
    Ready(ChatBackend),
    Failed(String),
}

/// Winning backend plus the reasons earlier candidates were skipped.
#[derive(Debug)]
pub struct LlmResolution {
    pub backend: ChatBackend,
    pub diagnostics: ProviderDiagnostics,
}

/// Default chat model for `kind`.
pub fn default_chat_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => DEFAULT_OPENAI_CHAT_MODEL,
        ProviderKind::Google => DEFAULT_GOOGLE_CHAT_MODEL,
        ProviderKind::Offline => DEFAULT_OFFLINE_CHAT_MODEL,
    }
}

/// Ordered candidate names.
///
/// A non-blank `preferred` is the only candidate. Otherwise the configured
/// provider comes first, followed by openai, google and fake. Duplicates
/// are kept.
pub fn candidate_list(settings: &Settings, preferred: Option<&str>) -> Vec<String> {
    if let Some(preferred) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        return vec![preferred.to_lowercase()];
    }

    let configured = settings
        .llm_provider
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    [configured.as_str(), "openai", "google", "fake"]
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Try to construct the backend for one candidate name.
pub fn try_candidate(
    name: &str,
    settings: &Settings,
    registry: &ProviderRegistry,
    model_override: Option<&str>,
) -> AppResult<CandidateOutcome> {
    let kind = match ProviderKind::parse(name) {
        Some(kind) => kind,
        None => return Ok(CandidateOutcome::Failed("unknown provider".to_string())),
    };

    match build_client(kind, settings, registry) {
        Ok(client) => {
            let model = model_override
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_chat_model(kind));
            Ok(CandidateOutcome::Ready(ChatBackend::new(
                kind.as_str(),
                model,
                client,
            )))
        }
        Err(err @ AppError::CredentialMissing { .. })
        | Err(err @ AppError::CapabilityUnavailable { .. }) => {
            Ok(CandidateOutcome::Failed(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn build_client(
    kind: ProviderKind,
    settings: &Settings,
    registry: &ProviderRegistry,
) -> AppResult<Arc<dyn LlmClient>> {
    registry.ensure_available(kind)?;

    let client: Arc<dyn LlmClient> = match kind {
        ProviderKind::Offline => Arc::new(EchoClient::new()),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(require_credential(kind, settings)?)),
        ProviderKind::Google => Arc::new(GoogleClient::new(require_credential(kind, settings)?)),
    };

    Ok(client)
}

fn require_credential(kind: ProviderKind, settings: &Settings) -> AppResult<String> {
    settings
        .credential(kind)
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::CredentialMissing {
            provider: kind.as_str().to_string(),
            env_var: kind.credential_env().unwrap_or_default().to_string(),
        })
}

/// Resolve the chat backend for a session.
///
/// # Errors
/// `ProviderInitialization` with every candidate's reason when none could
/// be constructed.
pub fn resolve_llm(
    settings: &Settings,
    registry: &ProviderRegistry,
    preferred: Option<&str>,
    model_override: Option<&str>,
) -> AppResult<LlmResolution> {
    let mut diagnostics = ProviderDiagnostics::new();

    for name in candidate_list(settings, preferred) {
        match try_candidate(&name, settings, registry, model_override)? {
            CandidateOutcome::Ready(backend) => {
                tracing::info!(
                    provider = %backend.provider,
                    model = %backend.model,
                    "Language model ready"
                );
                return Ok(LlmResolution {
                    backend,
                    diagnostics,
                });
            }
            CandidateOutcome::Failed(reason) => {
                tracing::debug!(provider = %name, %reason, "Skipping language model candidate");
                diagnostics.record(name, reason);
            }
        }
    }

    Err(AppError::ProviderInitialization(diagnostics))
}
