//! Embedding provider trait.

use docqa_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// Cloud and offline backends are peer implementations.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name ("openai", "google", "fake")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Expected embedding size for the configured model.
    ///
    /// Cloud models can return a different size than expected (for example
    /// after a model override); ingestion sizes collections from the
    /// vectors actually returned.
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Check that a provider returned one vector per input, all of one size.
pub(crate) fn check_batch(
    provider: &str,
    expected_len: usize,
    vectors: &[Vec<f32>],
) -> AppResult<()> {
    if vectors.len() != expected_len {
        return Err(AppError::Embedding(format!(
            "{} returned {} embeddings for {} inputs",
            provider,
            vectors.len(),
            expected_len
        )));
    }
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    if first.is_empty() {
        return Err(AppError::Embedding(format!("{} returned an empty embedding", provider)));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != first.len()) {
        return Err(AppError::Embedding(format!(
            "{} returned embeddings of mixed sizes ({} and {})",
            provider,
            first.len(),
            bad.len()
        )));
    }
    Ok(())
}
