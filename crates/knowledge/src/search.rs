//! Retrieval: nearest chunks for a query and the context built from them.

use crate::embeddings::resolve_embeddings;
use crate::store::{resolve_connection_url, HostResolver, StoreConnector};
use crate::types::ScoredChunk;
use docqa_core::{AppError, AppResult, ProviderRegistry, Settings};
use docqa_prompt::build_prompt;
use std::sync::Arc;

/// Result of one similarity search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Most similar first, at most k entries
    pub results: Vec<ScoredChunk>,
    /// Non-blank chunk texts joined by blank lines; empty when none
    pub context: String,
    /// Embedding provider that embedded the query
    pub backend: String,
}

/// A grounded prompt together with the search that produced it.
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub prompt: String,
    pub search: SearchOutcome,
}

/// Concatenate the trimmed, non-blank chunk texts in ranked order.
pub fn build_context(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .map(|(chunk, _)| chunk.trimmed_text())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runs searches against the configured collection.
///
/// Embeddings and the connection string are resolved on every call.
#[derive(Clone)]
pub struct Retriever {
    settings: Arc<Settings>,
    registry: ProviderRegistry,
    connector: Arc<dyn StoreConnector>,
    resolver: Arc<dyn HostResolver>,
}

impl Retriever {
    pub fn new(
        settings: Arc<Settings>,
        registry: ProviderRegistry,
        connector: Arc<dyn StoreConnector>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            settings,
            registry,
            connector,
            resolver,
        }
    }

    /// Up to `k` chunks most similar to `query`.
    ///
    /// # Errors
    /// - `EmptyQuery` for a blank query, checked before anything else
    /// - `Config` when `k` is 0
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        provider: Option<&str>,
    ) -> AppResult<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        if k == 0 {
            return Err(AppError::Config("k must be at least 1".to_string()));
        }

        let embeddings = resolve_embeddings(&self.settings, &self.registry, provider)?;
        let url = resolve_connection_url(&self.settings, self.resolver.as_ref()).await?;
        let store = self.connector.connect(&url).await?;

        let query_vector = embeddings.provider.embed(query).await?;
        let results = store
            .similarity_search(&self.settings.collection_name, &query_vector, k)
            .await?;

        let context = build_context(&results);

        tracing::debug!(
            results = results.len(),
            backend = embeddings.name(),
            collection = %self.settings.collection_name,
            "Similarity search finished"
        );

        Ok(SearchOutcome {
            results,
            context,
            backend: embeddings.name().to_string(),
        })
    }

    /// Search, then render the grounded prompt for `question`.
    pub async fn search_prompt(
        &self,
        question: &str,
        k: usize,
        provider: Option<&str>,
    ) -> AppResult<PromptOutcome> {
        let search = self.search(question, k, provider).await?;
        let prompt = build_prompt(question, &search.context)?;
        Ok(PromptOutcome { prompt, search })
    }
}
