//! LLM provider implementations.

pub mod echo;
pub mod google;
pub mod openai;

pub use echo::EchoClient;
pub use google::GoogleClient;
pub use openai::OpenAiClient;
