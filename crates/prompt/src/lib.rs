//! Prompt assembly for docqa.
//!
//! Renders the grounded-answer template that binds retrieved context and
//! the user question under "answer only from context" rules.

pub mod builder;

pub use builder::{build_prompt, PromptSections, EMPTY_CONTEXT, OUT_OF_CONTEXT_ANSWER};
