//! Chat command handler.
//!
//! Resolves the language model once, then answers questions read from
//! stdin until the user quits, stdin closes or Ctrl-C is pressed.

use super::PROVIDER_NAMES;
use crate::session::{ChatSession, QuestionHandler};
use clap::Args;
use docqa_core::{AppResult, ProviderRegistry, Settings};
use docqa_knowledge::{LanceDbConnector, Retriever, SystemResolver};
use docqa_llm::{resolve_llm, ChatBackend};
use docqa_prompt::{build_prompt, OUT_OF_CONTEXT_ANSWER};
use std::process::ExitCode;
use std::sync::Arc;

/// Interactive question answering over the ingested document
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks retrieved per question
    #[arg(
        short = 'k',
        long = "k",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub k: u32,

    /// Embedding provider used for retrieval
    #[arg(long, value_parser = PROVIDER_NAMES)]
    pub embedding_provider: Option<String>,

    /// Language model provider
    #[arg(long, value_parser = PROVIDER_NAMES)]
    pub llm_provider: Option<String>,

    /// Provider-specific model name
    #[arg(long)]
    pub llm_model: Option<String>,
}

impl ChatCommand {
    /// Execute the chat command. Exits with 1 when no language model can be initialized.
    pub async fn execute(&self, settings: &Settings) -> AppResult<ExitCode> {
        tracing::info!("Executing chat command");
        tracing::debug!("Chat command options: {:?}", self);

        let registry = ProviderRegistry::detect();

        let resolution = match resolve_llm(
            settings,
            &registry,
            self.llm_provider.as_deref(),
            self.llm_model.as_deref(),
        ) {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!("Failed to initialize language model: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        };

        for (provider, reason) in resolution.diagnostics.iter() {
            tracing::debug!("Language model '{}' skipped: {}", provider, reason);
        }

        let retriever = Retriever::new(
            Arc::new(settings.clone()),
            registry,
            Arc::new(LanceDbConnector),
            Arc::new(SystemResolver),
        );

        let handler = RetrievalHandler {
            retriever,
            backend: resolution.backend,
            k: self.k as usize,
            embedding_provider: self.embedding_provider.clone(),
        };

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        let mut session = ChatSession::new(handler);
        session.run(stdin, &mut stdout, interrupt).await?;

        tracing::info!("Chat finished after {} answers", session.answered());
        Ok(ExitCode::SUCCESS)
    }
}

/// Retrieval-grounded answering for one chat session.
struct RetrievalHandler {
    retriever: Retriever,
    backend: ChatBackend,
    k: usize,
    embedding_provider: Option<String>,
}

#[async_trait::async_trait]
impl QuestionHandler for RetrievalHandler {
    async fn answer(&self, question: &str) -> AppResult<String> {
        let outcome = self
            .retriever
            .search(question, self.k, self.embedding_provider.as_deref())
            .await?;

        tracing::debug!(
            "Retrieved {} chunks with '{}' embeddings for: {}",
            outcome.results.len(),
            outcome.backend,
            question
        );

        // Nothing to ground an answer in; skip the model call
        if outcome.context.is_empty() {
            return Ok(OUT_OF_CONTEXT_ANSWER.to_string());
        }

        let prompt = build_prompt(question, &outcome.context)?;
        self.backend.invoke(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use docqa_core::ProviderKind;
    use docqa_knowledge::{ingest, Chunk, InMemoryConnector, InMemoryStore, Metadata};
    use docqa_llm::{EchoClient, LlmClient, LlmRequest, LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIM: usize = 256;

    /// Counts completions and answers with a fixed text.
    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmClient for CountingClient {
        fn provider_name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LlmResponse {
                content: "  Two years.  ".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    async fn retriever_with(texts: &[&str]) -> Retriever {
        let settings = Settings {
            offline_embedding_dim: DIM,
            ..Settings::default()
        };
        let memory = Arc::new(InMemoryStore::new());
        let documents: Vec<Chunk> = texts.iter().map(|t| Chunk::new(*t, Metadata::new())).collect();
        let provider = docqa_knowledge::embeddings::providers::OfflineProvider::new(DIM);
        ingest(&documents, &provider, &settings.collection_name, memory.as_ref(), true)
            .await
            .unwrap();

        Retriever::new(
            Arc::new(settings),
            ProviderRegistry::with_available(&ProviderKind::ALL),
            Arc::new(InMemoryConnector::new(memory)),
            Arc::new(SystemResolver),
        )
    }

    #[tokio::test]
    async fn test_blank_context_skips_model() {
        let client = Arc::new(CountingClient::default());
        let handler = RetrievalHandler {
            retriever: retriever_with(&["   ", "\n\n"]).await,
            backend: ChatBackend::new("fake", "counting", client.clone()),
            k: 5,
            embedding_provider: Some("fake".to_string()),
        };

        let answer = handler.answer("How long is the warranty?").await.unwrap();

        assert_eq!(answer, OUT_OF_CONTEXT_ANSWER);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_grounded_answer_is_trimmed() {
        let client = Arc::new(CountingClient::default());
        let handler = RetrievalHandler {
            retriever: retriever_with(&["The warranty lasts two years from purchase."]).await,
            backend: ChatBackend::new("fake", "counting", client.clone()),
            k: 3,
            embedding_provider: None,
        };

        let answer = handler.answer("How long is the warranty?").await.unwrap();

        assert_eq!(answer, "Two years.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_with_echo_backend() {
        let handler = RetrievalHandler {
            retriever: retriever_with(&["Refunds are issued within ten business days."]).await,
            backend: ChatBackend::new("fake", "fake-local", Arc::new(EchoClient::new())),
            k: 2,
            embedding_provider: Some("fake".to_string()),
        };

        let mut session = ChatSession::new(handler);
        let mut output = Vec::new();
        session
            .run(
                "When are refunds issued?\nsair\n".as_bytes(),
                &mut output,
                std::future::pending(),
            )
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(output.contains("Assistant> (Offline simulation) When are refunds issued?"));
        assert!(output.contains("Refunds are issued within ten business days."));
    }

    #[tokio::test]
    async fn test_embedding_resolution_error_propagates() {
        let handler = RetrievalHandler {
            retriever: retriever_with(&["text"]).await,
            backend: ChatBackend::new("fake", "fake-local", Arc::new(EchoClient::new())),
            k: 2,
            embedding_provider: Some("google".to_string()),
        };

        // No GOOGLE_API_KEY in these settings
        assert!(handler.answer("anything").await.is_err());
    }
}
