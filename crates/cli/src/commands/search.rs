//! Search command handler.

use super::PROVIDER_NAMES;
use clap::Args;
use docqa_core::{AppResult, ProviderRegistry, Settings};
use docqa_knowledge::{LanceDbConnector, Retriever, ScoredChunk, SystemResolver};
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;

const RULE_WIDTH: usize = 80;

/// Show the chunks most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Question or search terms
    #[arg(short, long)]
    pub query: String,

    /// Number of chunks to return
    #[arg(
        short = 'k',
        long = "k",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub k: u32,

    /// Embedding provider (openai, google, fake)
    #[arg(long, value_parser = PROVIDER_NAMES)]
    pub provider: Option<String>,
}

impl SearchCommand {
    /// Execute the search command. Failures are logged and exit with 1.
    pub async fn execute(&self, settings: &Settings) -> AppResult<ExitCode> {
        tracing::info!("Executing search command");

        let retriever = Retriever::new(
            Arc::new(settings.clone()),
            ProviderRegistry::detect(),
            Arc::new(LanceDbConnector),
            Arc::new(SystemResolver),
        );

        match retriever
            .search(&self.query, self.k as usize, self.provider.as_deref())
            .await
        {
            Ok(outcome) => {
                tracing::info!("Search ran with '{}' embeddings", outcome.backend);
                println!("{}", format_results(&outcome.results));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Render ranked results for the terminal.
pub fn format_results(results: &[ScoredChunk]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    for (index, (chunk, score)) in results.iter().enumerate() {
        lines.push("=".repeat(RULE_WIDTH));
        lines.push(format!("Result {} | score={:.4}", index + 1, score));
        lines.push("-".repeat(RULE_WIDTH));
        lines.push(chunk.trimmed_text().to_string());

        if !chunk.metadata.is_empty() {
            lines.push("\nMetadata:".to_string());
            for (key, value) in &chunk.metadata {
                lines.push(format!("- {}: {}", key, display_value(value)));
            }
        }
    }
    lines.join("\n")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
