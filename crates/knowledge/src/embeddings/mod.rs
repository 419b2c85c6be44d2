//! Embedding backends and their resolution.
//!
//! The backend is resolved afresh on every ingestion and search call; no
//! provider instance outlives the call that built it.

pub mod provider;
pub mod providers;

pub use provider::EmbeddingProvider;

use docqa_core::{AppError, AppResult, ProviderKind, ProviderRegistry, Settings};
use providers::{GoogleEmbeddings, OfflineProvider, OpenAiEmbeddings};
use std::sync::Arc;

/// A constructed embedding backend.
#[derive(Debug, Clone)]
pub struct ResolvedEmbeddings {
    pub kind: ProviderKind,
    pub provider: Arc<dyn EmbeddingProvider>,
}

impl ResolvedEmbeddings {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Decide which embedding provider to use.
///
/// `explicit`, else the configured provider, else inferred from available
/// credentials: OpenAI key, then Google key, then the offline provider.
///
/// # Errors
/// `UnsupportedBackend` when the chosen name is not a known provider.
pub fn resolve_backend(settings: &Settings, explicit: Option<&str>) -> AppResult<ProviderKind> {
    let named = explicit
        .filter(|name| !name.trim().is_empty())
        .or(settings
            .embeddings_provider
            .as_deref()
            .filter(|name| !name.trim().is_empty()));

    if let Some(name) = named {
        return ProviderKind::try_parse(name);
    }

    let has_key = |kind: ProviderKind| {
        settings
            .credential(kind)
            .is_some_and(|key| !key.trim().is_empty())
    };

    let inferred = if has_key(ProviderKind::OpenAi) {
        ProviderKind::OpenAi
    } else if has_key(ProviderKind::Google) {
        ProviderKind::Google
    } else {
        ProviderKind::Offline
    };

    tracing::debug!("Inferred embedding provider '{}' from credentials", inferred);
    Ok(inferred)
}

/// Resolve and construct the embedding backend.
///
/// # Errors
/// - `UnsupportedBackend` for an unknown provider name
/// - `CapabilityUnavailable` when the registry reports the provider missing
/// - `CredentialMissing` for a cloud provider without its API key
pub fn resolve_embeddings(
    settings: &Settings,
    registry: &ProviderRegistry,
    provider: Option<&str>,
) -> AppResult<ResolvedEmbeddings> {
    let kind = resolve_backend(settings, provider)?;
    registry.ensure_available(kind)?;

    let provider: Arc<dyn EmbeddingProvider> = match kind {
        ProviderKind::Offline => Arc::new(OfflineProvider::new(settings.offline_embedding_dim)),
        ProviderKind::OpenAi => Arc::new(OpenAiEmbeddings::new(
            require_credential(settings, kind)?,
            settings.openai_embedding_model.clone(),
        )),
        ProviderKind::Google => Arc::new(GoogleEmbeddings::new(
            require_credential(settings, kind)?,
            settings.google_embedding_model.clone(),
        )),
    };

    tracing::debug!(
        provider = %kind,
        model = provider.model_name(),
        dimensions = provider.dimensions(),
        "Resolved embedding backend"
    );

    Ok(ResolvedEmbeddings { kind, provider })
}

fn require_credential(settings: &Settings, kind: ProviderKind) -> AppResult<String> {
    settings
        .credential(kind)
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::CredentialMissing {
            provider: kind.as_str().to_string(),
            env_var: kind.credential_env().unwrap_or_default().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_providers() -> ProviderRegistry {
        ProviderRegistry::with_available(&ProviderKind::ALL)
    }

    #[test]
    fn test_explicit_wins() {
        let settings = Settings {
            embeddings_provider: Some("openai".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_backend(&settings, Some("Google")).unwrap(), ProviderKind::Google);
    }

    #[test]
    fn test_configured_provider_used() {
        let settings = Settings {
            embeddings_provider: Some("fake".to_string()),
            openai_api_key: Some("sk".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_backend(&settings, None).unwrap(), ProviderKind::Offline);
    }

    #[test]
    fn test_inference_order() {
        let both = Settings {
            openai_api_key: Some("sk".to_string()),
            google_api_key: Some("g".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_backend(&both, None).unwrap(), ProviderKind::OpenAi);

        let openai_only = Settings {
            openai_api_key: Some("sk".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_backend(&openai_only, None).unwrap(), ProviderKind::OpenAi);

        let google_only = Settings {
            google_api_key: Some("g".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_backend(&google_only, None).unwrap(), ProviderKind::Google);

        assert_eq!(
            resolve_backend(&Settings::default(), None).unwrap(),
            ProviderKind::Offline
        );
    }

    #[test]
    fn test_unknown_backend() {
        match resolve_backend(&Settings::default(), Some("cohere")) {
            Err(AppError::UnsupportedBackend(name)) => assert_eq!(name, "cohere"),
            other => panic!("Expected UnsupportedBackend, got {:?}", other),
        }
    }

    #[test]
    fn test_cloud_provider_requires_credential() {
        let result = resolve_embeddings(&Settings::default(), &all_providers(), Some("openai"));
        match result {
            Err(AppError::CredentialMissing { provider, env_var }) => {
                assert_eq!(provider, "openai");
                assert_eq!(env_var, "OPENAI_API_KEY");
            }
            other => panic!("Expected CredentialMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_capability() {
        let settings = Settings {
            google_api_key: Some("g".to_string()),
            ..Settings::default()
        };
        let registry = ProviderRegistry::with_available(&[ProviderKind::Offline]);
        assert!(matches!(
            resolve_embeddings(&settings, &registry, Some("google")),
            Err(AppError::CapabilityUnavailable { .. })
        ));
    }

    #[test]
    fn test_offline_uses_configured_dimension() {
        let settings = Settings {
            offline_embedding_dim: 48,
            ..Settings::default()
        };
        let resolved = resolve_embeddings(&settings, &all_providers(), None).unwrap();

        assert_eq!(resolved.kind, ProviderKind::Offline);
        assert_eq!(resolved.name(), "fake");
        assert_eq!(resolved.provider.dimensions(), 48);
    }

    #[test]
    fn test_openai_model_from_settings() {
        let settings = Settings {
            openai_api_key: Some("sk".to_string()),
            openai_embedding_model: "text-embedding-3-large".to_string(),
            ..Settings::default()
        };
        let resolved = resolve_embeddings(&settings, &all_providers(), None).unwrap();

        assert_eq!(resolved.kind, ProviderKind::OpenAi);
        assert_eq!(resolved.provider.dimensions(), 3072);
    }
}
