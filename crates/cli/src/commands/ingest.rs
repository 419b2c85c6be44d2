//! Ingest command handler.

use clap::Args;
use docqa_core::{AppResult, ProviderRegistry, Settings};
use docqa_knowledge::{run_ingestion, IngestOptions, IngestReport, LanceDbConnector, SystemResolver};
use std::path::PathBuf;
use std::process::ExitCode;

/// Load a document, embed its chunks and store them
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Document to ingest (default: PDF_PATH or document.pdf)
    #[arg(long)]
    pub source_path: Option<PathBuf>,

    /// Embedding provider (openai, google, fake)
    #[arg(long)]
    pub provider: Option<String>,

    /// Add to the existing collection instead of recreating it
    #[arg(long)]
    pub append: bool,
}

impl IngestCommand {
    /// Execute the ingest command. Failures propagate to a non-zero exit.
    pub async fn execute(&self, settings: &Settings) -> AppResult<ExitCode> {
        tracing::info!("Executing ingest command");
        tracing::debug!("Ingest command options: {:?}", self);

        let options = IngestOptions {
            source_path: self.source_path.clone(),
            provider: self.provider.clone(),
            append: self.append,
        };

        let report = run_ingestion(
            settings,
            &ProviderRegistry::detect(),
            &LanceDbConnector,
            &SystemResolver,
            &options,
        )
        .await?;

        println!("{}", summary(&report, self.append));
        Ok(ExitCode::SUCCESS)
    }
}

fn summary(report: &IngestReport, append: bool) -> String {
    let mode = if append { "appended to" } else { "written to" };
    format!(
        "Ingested {} chunks from {} ({} embeddings), {} collection '{}'.",
        report.chunks,
        report.source.display(),
        report.provider,
        mode,
        report.collection
    )
}
