//! Language-model integration for docqa.
//!
//! A provider-agnostic [`LlmClient`] trait with peer implementations and
//! the fallback chain that picks one for a chat session.
//!
//! # Providers
//! - **openai**: OpenAI chat completions
//! - **google**: Gemini `generateContent`
//! - **fake**: offline echo model, always available
//!
//! # Example
//! ```no_run
//! use docqa_core::{ProviderRegistry, Settings};
//! use docqa_llm::resolve_llm;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None, None)?;
//! let resolution = resolve_llm(&settings, &ProviderRegistry::detect(), None, None)?;
//! let answer = resolution.backend.invoke("Hello").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod providers;
pub mod resolver;

// Re-export main types
pub use client::{ChatBackend, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use providers::{EchoClient, GoogleClient, OpenAiClient};
pub use resolver::{resolve_llm, CandidateOutcome, LlmResolution};
