//! Command handlers for the docqa CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod chat;
pub mod ingest;
pub mod search;

// Re-export command types for convenience
pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use search::SearchCommand;

/// Provider names accepted by `--provider`-style flags.
pub(crate) const PROVIDER_NAMES: [&str; 3] = ["openai", "google", "fake"];
