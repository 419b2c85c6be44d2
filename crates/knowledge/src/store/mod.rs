//! Vector store abstraction.
//!
//! A store holds named collections of `(id, text, metadata, embedding)`
//! rows and answers k-nearest-neighbour queries over them.

pub mod connection;
pub mod lancedb_store;
pub mod memory;

pub use self::connection::{resolve_connection_url, HostResolver, SystemResolver};
pub use self::lancedb_store::{LanceDbConnector, LanceDbStore};
pub use self::memory::{InMemoryConnector, InMemoryStore};

use crate::types::{ScoredChunk, StoredChunk};
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a store backend.
///
/// `AlreadyExists` is kept separate so collection creation can be treated
/// as idempotent.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Collection '{0}' already exists")]
    AlreadyExists(String),

    #[error("Collection '{0}' does not exist")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::StoreOperation(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for vector store backends.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Remove a collection and all of its rows.
    async fn delete_collection(&self, name: &str) -> StoreResult<()>;

    /// Create an empty collection for `dimensions`-sized embeddings.
    async fn create_collection(&self, name: &str, dimensions: usize) -> StoreResult<()>;

    /// Write rows, replacing existing rows with the same id.
    async fn add_documents(&self, name: &str, documents: &[StoredChunk]) -> StoreResult<usize>;

    /// Up to `k` rows closest to `query`, most similar first.
    async fn similarity_search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
    ) -> StoreResult<Vec<ScoredChunk>>;
}

/// Opens a [`VectorStore`] for a connection string.
#[async_trait::async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, url: &str) -> AppResult<Arc<dyn VectorStore>>;
}

/// Cosine similarity of two vectors; 0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_store_error_converts_to_store_operation() {
        let err: AppError = StoreError::Backend("disk full".to_string()).into();
        assert!(matches!(err, AppError::StoreOperation(ref msg) if msg == "disk full"));
    }
}
