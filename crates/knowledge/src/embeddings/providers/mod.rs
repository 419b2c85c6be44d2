//! Embedding provider implementations.

pub mod google;
pub mod offline;
pub mod openai;

pub use google::GoogleEmbeddings;
pub use offline::OfflineProvider;
pub use openai::OpenAiEmbeddings;
