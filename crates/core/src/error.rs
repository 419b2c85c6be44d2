//! Error types for docqa.
//!
//! This module defines a unified error enum covering configuration, provider
//! resolution, ingestion, retrieval and generation failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::ProviderDiagnostics;

/// Unified error type for docqa.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider name is not one of the known backends
    #[error("Unsupported backend '{0}'. Supported backends: openai, google, fake")]
    UnsupportedBackend(String),

    /// A provider that needs a credential was selected without one
    #[error("Missing credential for provider '{provider}': set {env_var}")]
    CredentialMissing { provider: String, env_var: String },

    /// Optional integration not present in this build or environment
    #[error("Provider '{provider}' is unavailable: {reason}")]
    CapabilityUnavailable { provider: String, reason: String },

    /// Every candidate of the language-model fallback chain failed
    #[error("Could not initialize a language model ({0})")]
    ProviderInitialization(ProviderDiagnostics),

    /// Connection host could not be resolved and no fallback is configured
    #[error("Hostname '{host}' could not be resolved: {reason}")]
    NetworkResolution { host: String, reason: String },

    /// Ingestion source does not exist
    #[error("Source document not found at {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Ingestion source produced no chunks
    #[error("No chunks were generated from {}", .0.display())]
    EmptyDocument(PathBuf),

    /// Vector store create/delete/write/search failures
    #[error("Vector store error: {0}")]
    StoreOperation(String),

    /// Search was called with a blank query
    #[error("Query must be a non-empty string")]
    EmptyQuery,

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document loading and text extraction errors
    #[error("Document error: {0}")]
    Document(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
