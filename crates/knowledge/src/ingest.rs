//! Ingestion: write chunks and their embeddings into a collection.

use crate::document::{load_documents, resolve_source_path};
use crate::embeddings::{resolve_embeddings, EmbeddingProvider};
use crate::store::{resolve_connection_url, HostResolver, StoreConnector, StoreError, VectorStore};
use crate::types::{Chunk, StoredChunk};
use docqa_core::{AppError, AppResult, ProviderRegistry, Settings};
use std::path::PathBuf;

/// Options for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Document to ingest instead of the configured one
    pub source_path: Option<PathBuf>,

    /// Embedding provider name
    pub provider: Option<String>,

    /// Keep the existing collection instead of recreating it
    pub append: bool,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: PathBuf,
    pub chunks: usize,
    pub provider: String,
    pub collection: String,
}

/// Identifier of the `index`-th document in a batch.
pub fn document_id(index: usize) -> String {
    format!("doc-{}", index)
}

/// Embed `documents` and write them to `collection`.
///
/// Documents are embedded before the store is touched, and the collection
/// is sized from the returned vectors. With `reset`, the collection is
/// then deleted; a failed delete is only logged. Creating a collection that
/// already exists is not an error.
/// Ids are `doc-0`, `doc-1`, ... for this batch, so an append run replaces
/// rows written by an earlier run under the same ids.
///
/// Returns the number of rows written.
pub async fn ingest(
    documents: &[Chunk],
    embeddings: &dyn EmbeddingProvider,
    collection: &str,
    store: &dyn VectorStore,
    reset: bool,
) -> AppResult<usize> {
    let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
    let vectors = embeddings.embed_batch(&texts).await?;

    if vectors.len() != documents.len() {
        return Err(AppError::Embedding(format!(
            "Expected {} embeddings, got {}",
            documents.len(),
            vectors.len()
        )));
    }

    let dimensions = vectors
        .first()
        .map(Vec::len)
        .unwrap_or_else(|| embeddings.dimensions());
    if dimensions != embeddings.dimensions() {
        tracing::info!(
            "Model '{}' returned {}-dimensional embeddings (expected {})",
            embeddings.model_name(),
            dimensions,
            embeddings.dimensions()
        );
    }

    if reset {
        if let Err(e) = store.delete_collection(collection).await {
            tracing::warn!("Could not delete collection '{}': {}", collection, e);
        }
    }

    match store.create_collection(collection, dimensions).await {
        Ok(()) => tracing::debug!("Created collection '{}'", collection),
        Err(StoreError::AlreadyExists(_)) => {
            tracing::debug!("Collection '{}' already exists", collection)
        }
        Err(e) => {
            return Err(AppError::StoreOperation(format!(
                "Failed to create collection '{}': {}",
                collection, e
            )))
        }
    }

    let rows: Vec<StoredChunk> = documents
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(index, (chunk, embedding))| StoredChunk {
            id: document_id(index),
            chunk: chunk.clone(),
            embedding,
        })
        .collect();

    let written = store.add_documents(collection, &rows).await?;
    tracing::info!("Wrote {} chunks to collection '{}'", written, collection);
    Ok(written)
}

/// Full ingestion pipeline: resolve source, load, embed, store.
pub async fn run_ingestion(
    settings: &Settings,
    registry: &ProviderRegistry,
    connector: &dyn StoreConnector,
    resolver: &dyn HostResolver,
    options: &IngestOptions,
) -> AppResult<IngestReport> {
    let source = resolve_source_path(settings, options.source_path.as_deref())?;
    let documents = load_documents(&source)?;

    let embeddings = resolve_embeddings(settings, registry, options.provider.as_deref())?;
    tracing::info!(
        "Embedding {} chunks with '{}' ({})",
        documents.len(),
        embeddings.name(),
        embeddings.provider.model_name()
    );

    let url = resolve_connection_url(settings, resolver).await?;
    let store = connector.connect(&url).await?;

    let chunks = ingest(
        &documents,
        embeddings.provider.as_ref(),
        &settings.collection_name,
        store.as_ref(),
        !options.append,
    )
    .await?;

    Ok(IngestReport {
        source,
        chunks,
        provider: embeddings.name().to_string(),
        collection: settings.collection_name.clone(),
    })
}
