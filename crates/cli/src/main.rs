//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Ingests a document into a vector collection, runs similarity searches
//! against it and answers questions grounded in the retrieved chunks.

mod commands;
mod session;

use clap::{Parser, Subcommand};
use commands::{ChatCommand, IngestCommand, SearchCommand};
use docqa_core::{logging, AppResult, Settings};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Instrument;

/// docqa - question answering over your own documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Question answering grounded in an ingested document", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.docqa/config.yaml)
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a document, embed its chunks and store them
    Ingest(IngestCommand),

    /// Show the chunks most similar to a query
    Search(SearchCommand),

    /// Interactive question answering over the ingested document
    Chat(ChatCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Search(_) => "search",
            Commands::Chat(_) => "chat",
        }
    }
}

/// Read `<workspace>/.env` without overriding variables already set.
fn load_workspace_dotenv(workspace: &Path) -> Option<PathBuf> {
    let path = workspace.join(".env");
    dotenvy::from_path(&path).ok().map(|_| path)
}

#[tokio::main]
async fn main() -> AppResult<ExitCode> {
    // .env in the working directory (or a parent) feeds clap's env fallbacks
    let mut dotenv_files: Vec<PathBuf> = dotenvy::dotenv().ok().into_iter().collect();

    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    if let Some(path) = cli.workspace.as_deref().and_then(load_workspace_dotenv) {
        if !dotenv_files.contains(&path) {
            dotenv_files.push(path);
        }
    }

    // Defaults < config file < environment < CLI
    let settings = Settings::load(cli.workspace, cli.config)?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(&settings)?;

    tracing::info!("docqa starting");
    for path in &dotenv_files {
        tracing::debug!("Loaded environment file {:?}", path);
    }
    tracing::debug!("Workspace: {:?}", settings.workspace);
    tracing::debug!("Collection: {}", settings.collection_name);

    settings.ensure_docqa_dir()?;

    let command_name = cli.command.name();
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Ingest(cmd) => cmd.execute(&settings).await,
            Commands::Search(cmd) => cmd.execute(&settings).await,
            Commands::Chat(cmd) => cmd.execute(&settings).await,
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command '{}' finished", command_name),
        Err(e) => tracing::error!("Command '{}' failed: {}", command_name, e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_workspace_dotenv_fills_unset_variables() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".env"),
            "DOCQA_TEST_DOTENV_FRESH=from-file\nDOCQA_TEST_DOTENV_KEPT=from-file\n",
        )
        .unwrap();
        std::env::set_var("DOCQA_TEST_DOTENV_KEPT", "from-shell");

        let loaded = load_workspace_dotenv(temp.path());

        assert_eq!(loaded, Some(temp.path().join(".env")));
        assert_eq!(std::env::var("DOCQA_TEST_DOTENV_FRESH").unwrap(), "from-file");
        assert_eq!(std::env::var("DOCQA_TEST_DOTENV_KEPT").unwrap(), "from-shell");
    }

    #[test]
    fn test_missing_workspace_dotenv_is_ignored() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(load_workspace_dotenv(temp.path()), None);
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["docqa", "search"]).is_err());
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["docqa", "search", "-q", "warranty"]).unwrap();
        match cli.command {
            Commands::Search(cmd) => {
                assert_eq!(cmd.query, "warranty");
                assert_eq!(cmd.k, 5);
                assert!(cmd.provider.is_none());
            }
            other => panic!("Expected search, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_k_rejected_by_parser() {
        assert!(Cli::try_parse_from(["docqa", "search", "-q", "x", "-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["docqa", "chat", "--k", "0"]).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected_for_search_and_chat() {
        assert!(
            Cli::try_parse_from(["docqa", "search", "-q", "x", "--provider", "cohere"]).is_err()
        );
        assert!(Cli::try_parse_from(["docqa", "chat", "--llm-provider", "ollama"]).is_err());
    }

    #[test]
    fn test_chat_defaults_and_global_flags() {
        let cli = Cli::try_parse_from([
            "docqa",
            "chat",
            "--llm-provider",
            "fake",
            "--verbose",
            "--no-color",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(cli.no_color);
        match cli.command {
            Commands::Chat(cmd) => {
                assert_eq!(cmd.k, 10);
                assert_eq!(cmd.llm_provider.as_deref(), Some("fake"));
                assert!(cmd.llm_model.is_none());
            }
            other => panic!("Expected chat, got {:?}", other),
        }
    }

    #[test]
    fn test_ingest_flags() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ingest",
            "--source-path",
            "manual.pdf",
            "--provider",
            "fake",
            "--append",
        ])
        .unwrap();

        assert_eq!(cli.command.name(), "ingest");
        match cli.command {
            Commands::Ingest(cmd) => {
                assert_eq!(cmd.source_path, Some(PathBuf::from("manual.pdf")));
                assert_eq!(cmd.provider.as_deref(), Some("fake"));
                assert!(cmd.append);
            }
            other => panic!("Expected ingest, got {:?}", other),
        }
    }
}
