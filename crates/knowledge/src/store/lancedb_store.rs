//! LanceDB-backed vector store.
//!
//! Each collection is a LanceDB table with columns `id`, `text`,
//! `metadata` (JSON string) and `embedding` (fixed-size float list).
//! Similarity is cosine; scores are `1 - distance`.

use super::{StoreConnector, StoreError, StoreResult, VectorStore};
use crate::types::{Chunk, Metadata, ScoredChunk, StoredChunk};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use docqa_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;

const DISTANCE_COLUMN: &str = "_distance";

/// Vector store over one LanceDB connection.
pub struct LanceDbStore {
    conn: Connection,
}

impl LanceDbStore {
    /// Connect to a LanceDB database (local directory or remote URI).
    pub async fn connect(uri: &str) -> StoreResult<Self> {
        let conn = lancedb::connect(uri)
            .execute()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to LanceDB: {}", e)))?;

        tracing::debug!("Connected to LanceDB at {}", uri);
        Ok(Self { conn })
    }

    /// Arrow schema for a collection of `dimensions`-sized embeddings.
    fn create_schema(dimensions: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("metadata", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimensions as i32,
                ),
                false,
            ),
        ]))
    }

    fn embedding_dimension(schema: &Schema) -> StoreResult<usize> {
        match schema.field_with_name("embedding").map(|f| f.data_type()) {
            Ok(DataType::FixedSizeList(_, size)) => Ok(*size as usize),
            _ => Err(StoreError::Backend(
                "Collection has no fixed-size embedding column".to_string(),
            )),
        }
    }

    /// Convert rows to one Arrow RecordBatch.
    fn to_batch(documents: &[StoredChunk], dimensions: usize) -> StoreResult<RecordBatch> {
        let mut values = Vec::with_capacity(documents.len() * dimensions);
        for document in documents {
            if document.embedding.len() != dimensions {
                return Err(StoreError::Backend(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    dimensions,
                    document.embedding.len()
                )));
            }
            values.extend_from_slice(&document.embedding);
        }

        let metadata = documents
            .iter()
            .map(|d| serde_json::to_string(&d.chunk.metadata))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Backend(format!("Failed to serialize metadata: {}", e)))?;

        let ids = StringArray::from_iter_values(documents.iter().map(|d| d.id.as_str()));
        let texts = StringArray::from_iter_values(documents.iter().map(|d| d.chunk.text.as_str()));
        let metadata = StringArray::from_iter_values(metadata.iter().map(String::as_str));

        let embeddings = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            dimensions as i32,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .map_err(|e| StoreError::Backend(format!("Failed to build embedding column: {}", e)))?;

        RecordBatch::try_new(
            Self::create_schema(dimensions),
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(metadata),
                Arc::new(embeddings),
            ],
        )
        .map_err(|e| StoreError::Backend(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Read scored chunks out of a search result batch.
    fn scored_rows(batch: &RecordBatch) -> StoreResult<Vec<ScoredChunk>> {
        let texts = string_column(batch, "text")?;
        let metadata = string_column(batch, "metadata")?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| {
                StoreError::Backend("Search result has no distance column".to_string())
            })?;

        (0..batch.num_rows())
            .map(|row| {
                let metadata: Metadata = serde_json::from_str(metadata.value(row)).map_err(|e| {
                    StoreError::Backend(format!("Failed to parse metadata: {}", e))
                })?;
                let chunk = Chunk::new(texts.value(row), metadata);
                Ok((chunk, 1.0 - distances.value(row)))
            })
            .collect()
    }

    async fn table_exists(&self, name: &str) -> StoreResult<bool> {
        let names = self
            .conn
            .table_names()
            .execute()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to list tables: {}", e)))?;
        Ok(names.iter().any(|n| n == name))
    }

    async fn open(&self, name: &str) -> StoreResult<lancedb::Table> {
        self.conn
            .open_table(name)
            .execute()
            .await
            .map_err(|e| match e {
                lancedb::Error::TableNotFound { .. } => StoreError::NotFound(name.to_string()),
                other => StoreError::Backend(format!("Failed to open table '{}': {}", name, other)),
            })
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> StoreResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Backend(format!("Invalid {} column", name)))
}

#[async_trait::async_trait]
impl VectorStore for LanceDbStore {
    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        self.conn
            .drop_table(name, &[])
            .await
            .map_err(|e| match e {
                lancedb::Error::TableNotFound { .. } => StoreError::NotFound(name.to_string()),
                other => StoreError::Backend(format!("Failed to drop table '{}': {}", name, other)),
            })?;

        tracing::debug!("Dropped LanceDB table '{}'", name);
        Ok(())
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> StoreResult<()> {
        if self.table_exists(name).await? {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let schema = Self::create_schema(dimensions);
        let empty_batch = RecordBatch::new_empty(schema.clone());

        self.conn
            .create_table(
                name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| match e {
                lancedb::Error::TableAlreadyExists { .. } => {
                    StoreError::AlreadyExists(name.to_string())
                }
                other => {
                    StoreError::Backend(format!("Failed to create table '{}': {}", name, other))
                }
            })?;

        tracing::debug!("Created LanceDB table '{}' ({} dims)", name, dimensions);
        Ok(())
    }

    async fn add_documents(&self, name: &str, documents: &[StoredChunk]) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let table = self.open(name).await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to read table schema: {}", e)))?;
        let dimensions = Self::embedding_dimension(&schema)?;

        let batch = Self::to_batch(documents, dimensions)?;
        let reader = RecordBatchIterator::new(vec![Ok(batch.clone())], batch.schema());

        let mut merge = table.merge_insert(&["id"]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to write rows: {}", e)))?;

        tracing::debug!("Upserted {} rows into '{}'", documents.len(), name);
        Ok(documents.len())
    }

    async fn similarity_search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
    ) -> StoreResult<Vec<ScoredChunk>> {
        let table = self.open(name).await?;

        let batches: Vec<RecordBatch> = table
            .query()
            .nearest_to(query.to_vec())
            .map_err(|e| StoreError::Backend(format!("Failed to create query: {}", e)))?
            .column("embedding")
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(Self::scored_rows(batch)?);
        }

        tracing::debug!("Retrieved {} rows from '{}' (k={})", results.len(), name, k);
        Ok(results)
    }
}

/// Opens LanceDB stores.
///
/// Local directory URIs get their parent directory created first.
#[derive(Debug, Clone, Default)]
pub struct LanceDbConnector;

#[async_trait::async_trait]
impl StoreConnector for LanceDbConnector {
    async fn connect(&self, url: &str) -> AppResult<Arc<dyn VectorStore>> {
        if !url.contains("://") {
            if let Some(parent) = Path::new(url).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::StoreOperation(format!("Failed to create store directory: {}", e))
                })?;
            }
        }

        let store = LanceDbStore::connect(url).await?;
        Ok(Arc::new(store))
    }
}
