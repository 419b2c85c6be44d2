//! Interactive question/answer loop.
//!
//! The loop reads one question per line, hands it to a [`QuestionHandler`]
//! and prints the answer. It is generic over its input, output and
//! interrupt signal so it can be driven without a terminal.

use docqa_core::AppResult;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Inputs that end the session (compared case-insensitively).
pub const QUIT_COMMANDS: [&str; 4] = ["/exit", "exit", "quit", "sair"];

pub const GREETING: &str = "Assistant ready. Type your question or '/exit' to quit.";
pub const FAREWELL: &str = "Shutting down. Goodbye!";
pub const TURN_FAILURE: &str = "An error occurred while processing your question.";

pub const USER_PROMPT: &str = "You> ";
pub const ASSISTANT_PREFIX: &str = "Assistant> ";

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line
    AwaitingInput,
    /// Answering a question
    Running,
    Terminated,
}

/// Answers one question.
#[async_trait::async_trait]
pub trait QuestionHandler: Send + Sync {
    async fn answer(&self, question: &str) -> AppResult<String>;
}

pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim();
    QUIT_COMMANDS
        .iter()
        .any(|command| command.eq_ignore_ascii_case(input))
}

/// A chat session over one handler.
pub struct ChatSession<H> {
    handler: H,
    state: SessionState,
    answered: usize,
}

impl<H: QuestionHandler> ChatSession<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: SessionState::AwaitingInput,
            answered: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of questions that received an answer (including failure notices).
    pub fn answered(&self) -> usize {
        self.answered
    }

    /// Run until a quit command, end of input or `interrupt` completes.
    ///
    /// Handler errors are logged and answered with [`TURN_FAILURE`]. Lines
    /// that are not valid UTF-8 are logged and skipped. Only I/O errors on
    /// `input` or `output` end the loop with an error.
    pub async fn run<R, W, I>(
        &mut self,
        mut input: R,
        output: &mut W,
        interrupt: I,
    ) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        I: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut buf = Vec::new();

        writeln!(output, "{}", GREETING)?;
        self.state = SessionState::AwaitingInput;

        while self.state != SessionState::Terminated {
            write!(output, "{}", USER_PROMPT)?;
            output.flush()?;

            buf.clear();
            let read = tokio::select! {
                _ = &mut interrupt => 0,
                read = input.read_until(b'\n', &mut buf) => read?,
            };

            if read == 0 {
                // Ctrl-C or EOF leaves the cursor after the prompt
                writeln!(output)?;
                self.terminate(output)?;
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Skipping input line that is not valid UTF-8: {}", e);
                    continue;
                }
            };

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_quit_command(question) {
                self.terminate(output)?;
                break;
            }

            self.state = SessionState::Running;

            let answer = tokio::select! {
                _ = &mut interrupt => None,
                answer = self.handler.answer(question) => Some(answer),
            };

            let answer = match answer {
                Some(Ok(answer)) => answer,
                Some(Err(e)) => {
                    tracing::error!("Failed to process question: {}", e);
                    TURN_FAILURE.to_string()
                }
                None => {
                    writeln!(output)?;
                    self.terminate(output)?;
                    break;
                }
            };

            writeln!(output, "{}{}", ASSISTANT_PREFIX, answer)?;
            self.answered += 1;
            self.state = SessionState::AwaitingInput;
        }

        Ok(())
    }

    fn terminate<W: Write>(&mut self, output: &mut W) -> AppResult<()> {
        writeln!(output, "{}", FAREWELL)?;
        output.flush()?;
        self.state = SessionState::Terminated;
        tracing::debug!(answered = self.answered, "Chat session terminated");
        Ok(())
    }
}
