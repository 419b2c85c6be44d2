//! Document knowledge base.
//!
//! Loads a source document, splits it into overlapping chunks, embeds them
//! and keeps them in a vector store collection that retrieval queries by
//! cosine similarity.

pub mod chunker;
pub mod document;
pub mod embeddings;
pub mod ingest;
pub mod search;
pub mod store;
pub mod types;

pub use chunker::{chunk_text, TextWindow, CHUNK_OVERLAP, CHUNK_SIZE};
pub use document::{load_documents, resolve_source_path, SourceFormat, DEFAULT_SOURCE_FILE};
pub use embeddings::{resolve_backend, resolve_embeddings, EmbeddingProvider, ResolvedEmbeddings};
pub use ingest::{document_id, ingest, run_ingestion, IngestOptions, IngestReport};
pub use search::{build_context, PromptOutcome, Retriever, SearchOutcome};
pub use store::{
    HostResolver, InMemoryConnector, InMemoryStore, LanceDbConnector, StoreConnector, StoreError,
    SystemResolver, VectorStore,
};
pub use types::{Chunk, Metadata, ScoredChunk, StoredChunk};
