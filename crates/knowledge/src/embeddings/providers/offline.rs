//! Offline embedding provider using hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use docqa_core::AppResult;
use std::collections::{HashMap, HashSet};

pub const OFFLINE_MODEL: &str = "hashed-trigram";

const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic, network-free embeddings.
///
/// Each non-stop word adds weight to the buckets of its character trigrams
/// and of the whole word; the result is unit-normalized. Texts sharing
/// vocabulary land close together, which is enough for local runs and
/// tests.
#[derive(Debug)]
pub struct OfflineProvider {
    dimensions: usize,
}

impl OfflineProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let stop_words: HashSet<&str> = STOP_WORDS.into_iter().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.chars().count() > 2)
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let hash = trigram
                    .iter()
                    .collect::<String>()
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
                embedding[(hash as usize) % self.dimensions] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OfflineProvider {
    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        OFFLINE_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_dimensions_and_normalization() {
        let provider = OfflineProvider::new(64);
        let embedding = provider.embed("warranty coverage details").await.unwrap();

        assert_eq!(embedding.len(), 64);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = OfflineProvider::new(1536);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = OfflineProvider::new(1536);
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("goodbye world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = OfflineProvider::new(32);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = OfflineProvider::new(128);
        let texts = vec!["first text".to_string(), "second passage".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("first text").await.unwrap());
        assert_eq!(batch[1], provider.embed("second passage").await.unwrap());
    }

    #[tokio::test]
    async fn test_utf8_text() {
        let provider = OfflineProvider::new(256);
        let embedding = provider
            .embed("Garantia válida por dois anos após a compra ção")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
