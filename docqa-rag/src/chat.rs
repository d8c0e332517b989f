//! Chat-completion trait and follow-up question condensation.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::document::{Role, Turn};
use crate::error::Result;

/// A text-in, text-out chat-completion model.
///
/// Only used to rewrite follow-up questions into standalone ones; answers are
/// composed from retrieved chunks, never generated.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete `prompt` and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// A short model name for logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Build the prompt asking the model to rewrite `question` as a standalone question.
pub fn condense_prompt(history: &[Turn], question: &str) -> String {
    let mut prompt = String::from(
        "Given the following conversation and a follow-up question, rephrase the follow-up \
         question to be a standalone question. Reply with the question only.\n\nConversation:\n",
    );
    for turn in history {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(turn.text.trim());
        prompt.push('\n');
    }
    prompt.push_str("\nFollow-up question: ");
    prompt.push_str(question.trim());
    prompt.push_str("\nStandalone question:");
    prompt
}

/// Rewrite `question` into a standalone form using the last `max_turns` turns.
///
/// Falls back to the raw question when there is no history, no model, the
/// model fails, or it replies with nothing.
pub async fn condense_question(
    model: Option<&dyn ChatModel>,
    history: &[Turn],
    question: &str,
    max_turns: usize,
) -> String {
    let Some(model) = model else {
        return question.to_string();
    };
    if history.is_empty() || max_turns == 0 {
        return question.to_string();
    }

    let recent = &history[history.len().saturating_sub(max_turns)..];
    match model.complete(&condense_prompt(recent, question)).await {
        Ok(reply) => {
            let condensed = reply.trim().trim_matches('"').trim();
            if condensed.is_empty() {
                question.to_string()
            } else {
                debug!(model = model.name(), condensed, "condensed follow-up question");
                condensed.to_string()
            }
        }
        Err(e) => {
            warn!(
                model = model.name(),
                error = %e,
                "question condensation failed, using raw question"
            );
            question.to_string()
        }
    }
}
