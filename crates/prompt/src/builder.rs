//! Grounded-answer prompt rendering.
//!
//! The template is fixed: a context block, rules forbidding outside
//! knowledge, worked refusal examples and the user question. The offline
//! echo model reads the rendered text back through [`PromptSections`].

use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Exact sentence the model must answer with when the context lacks the answer.
pub const OUT_OF_CONTEXT_ANSWER: &str =
    "I don't have the information needed to answer your question.";

/// Placeholder rendered when no context was retrieved.
pub const EMPTY_CONTEXT: &str = "N/A";

pub const CONTEXT_MARKER: &str = "CONTEXT:";
pub const RULES_MARKER: &str = "RULES:";
pub const QUESTION_MARKER: &str = "USER QUESTION:";

const TEMPLATE_NAME: &str = "grounded-answer";

const TEMPLATE: &str = r#"CONTEXT:
{{context}}

RULES:
- Answer only based on the CONTEXT.
- If the information is not explicitly in the CONTEXT, answer:
  "{{refusal}}"
- Never make things up or use outside knowledge.
- Never give opinions or interpretations beyond what is written.

EXAMPLES OF OUT-OF-CONTEXT QUESTIONS:
Question: "What is the capital of France?"
Answer: "{{refusal}}"

Question: "How many customers do we have in 2024?"
Answer: "{{refusal}}"

Question: "Do you think this is good or bad?"
Answer: "{{refusal}}"

USER QUESTION:
{{question}}

ANSWER THE "USER QUESTION""#;

#[derive(Serialize)]
struct TemplateVars<'a> {
    context: &'a str,
    question: &'a str,
    refusal: &'a str,
}

/// Render the grounded-answer prompt for `question` over `context`.
///
/// An empty `context` renders as `N/A`. Deterministic for a given pair of
/// inputs.
///
/// # Example
/// ```
/// use docqa_prompt::build_prompt;
///
/// let prompt = build_prompt("What is the warranty?", "Warranty: two years.").unwrap();
/// assert!(prompt.contains("Warranty: two years."));
/// ```
pub fn build_prompt(question: &str, context: &str) -> AppResult<String> {
    let context = if context.is_empty() {
        EMPTY_CONTEXT
    } else {
        context
    };

    let vars = TemplateVars {
        context,
        question,
        refusal: OUT_OF_CONTEXT_ANSWER,
    };

    let rendered = render_template(&vars)?;
    tracing::debug!(chars = rendered.len(), "Rendered grounded-answer prompt");
    Ok(rendered)
}

/// Render the fixed template with `vars`.
fn render_template(vars: &TemplateVars<'_>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(TEMPLATE_NAME, vars)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Context and question recovered from a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSections {
    /// Text between the context and rules markers, trimmed
    pub context: String,
    /// First line after the question marker; empty if there is none
    pub question: String,
}

impl PromptSections {
    /// Split a rendered prompt on its markers.
    ///
    /// Without a context marker the whole prompt (up to the rules marker)
    /// is treated as context.
    pub fn parse(prompt: &str) -> Self {
        let after_context = prompt
            .split_once(CONTEXT_MARKER)
            .map(|(_, tail)| tail)
            .unwrap_or(prompt);
        let context = after_context
            .split_once(RULES_MARKER)
            .map(|(head, _)| head)
            .unwrap_or(after_context)
            .trim()
            .to_string();

        let question = prompt
            .split_once(QUESTION_MARKER)
            .and_then(|(_, tail)| tail.trim().lines().next())
            .unwrap_or("")
            .to_string();

        Self { context, question }
    }

    /// True when the prompt carries no usable context.
    pub fn has_no_context(&self) -> bool {
        self.context.is_empty() || self.context == EMPTY_CONTEXT
    }
}
