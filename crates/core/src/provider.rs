//! Known model providers and the capability registry.
//!
//! Embedding and language-model resolution both pick from the same three
//! providers. Whether an optional integration is usable is answered by
//! [`ProviderRegistry`] instead of being inferred from what happened to
//! compile.

use std::collections::HashSet;
use std::fmt;

use crate::error::{AppError, AppResult};

/// A model provider known to docqa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI REST API
    OpenAi,
    /// Google Generative Language API
    Google,
    /// Deterministic, network-free stand-in
    Offline,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Google, Self::Offline];

    /// Parse a provider name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "google" => Some(Self::Google),
            "fake" => Some(Self::Offline),
            _ => None,
        }
    }

    /// Like [`ProviderKind::parse`], failing with `UnsupportedBackend`.
    pub fn try_parse(name: &str) -> AppResult<Self> {
        Self::parse(name).ok_or_else(|| AppError::UnsupportedBackend(name.trim().to_string()))
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Offline => "fake",
        }
    }

    /// Environment variable holding the provider's credential.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Offline => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers "is provider X available in this build/environment".
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    available: HashSet<ProviderKind>,
}

impl ProviderRegistry {
    /// Registry reflecting the features this binary was built with.
    pub fn detect() -> Self {
        let mut available = HashSet::new();
        available.insert(ProviderKind::OpenAi);
        available.insert(ProviderKind::Offline);
        if cfg!(feature = "google") {
            available.insert(ProviderKind::Google);
        }
        Self { available }
    }

    /// Registry with an explicit set of available providers.
    pub fn with_available(providers: &[ProviderKind]) -> Self {
        Self {
            available: providers.iter().copied().collect(),
        }
    }

    pub fn is_available(&self, provider: ProviderKind) -> bool {
        self.available.contains(&provider)
    }

    /// Fail with `CapabilityUnavailable` unless `provider` is available.
    pub fn ensure_available(&self, provider: ProviderKind) -> AppResult<()> {
        if self.is_available(provider) {
            return Ok(());
        }
        Err(AppError::CapabilityUnavailable {
            provider: provider.as_str().to_string(),
            reason: format!(
                "this build does not include the '{}' integration",
                provider.as_str()
            ),
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::detect()
    }
}
