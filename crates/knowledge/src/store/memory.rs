//! In-memory [`VectorStore`] with brute-force cosine search.

use super::{cosine_similarity, StoreConnector, StoreError, StoreResult, VectorStore};
use crate::types::{ScoredChunk, StoredChunk};
use docqa_core::AppResult;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Collection {
    dimensions: usize,
    /// Insertion order is kept; ids are unique
    rows: Vec<StoredChunk>,
}

/// Process-local store, mainly for tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Collection>> {
        self.collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Collection>> {
        self.collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of rows in `name`, if it exists.
    pub fn count(&self, name: &str) -> Option<usize> {
        self.read().get(name).map(|c| c.rows.len())
    }

    /// Ids stored in `name`, in insertion order.
    pub fn ids(&self, name: &str) -> Vec<String> {
        self.read()
            .get(name)
            .map(|c| c.rows.iter().map(|row| row.id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryStore {
    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        match self.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> StoreResult<()> {
        let mut collections = self.write();
        if collections.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            Collection {
                dimensions,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_documents(&self, name: &str, documents: &[StoredChunk]) -> StoreResult<usize> {
        let mut collections = self.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        for document in documents {
            if document.embedding.len() != collection.dimensions {
                return Err(StoreError::Backend(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    collection.dimensions,
                    document.embedding.len()
                )));
            }
        }

        for document in documents {
            match collection.rows.iter_mut().find(|row| row.id == document.id) {
                Some(row) => *row = document.clone(),
                None => collection.rows.push(document.clone()),
            }
        }

        Ok(documents.len())
    }

    async fn similarity_search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
    ) -> StoreResult<Vec<ScoredChunk>> {
        let collections = self.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let mut scored: Vec<ScoredChunk> = collection
            .rows
            .iter()
            .map(|row| (row.chunk.clone(), cosine_similarity(query, &row.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Hands out the same in-memory store for every connection string.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    store: Arc<InMemoryStore>,
}

impl InMemoryConnector {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(&self, _url: &str) -> AppResult<Arc<dyn VectorStore>> {
        Ok(self.store.clone())
    }
}
