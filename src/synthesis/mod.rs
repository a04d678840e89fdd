// Answer synthesis
// Grounded prompting with a bounded continuation loop and retrieval-based confidence

pub mod prompt;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::completion::{CompletionClient, CompletionError, Message};
use crate::corpus::ChunkMetadata;
use crate::retrieval::RetrievedChunk;
use crate::{RagError, Result};

/// Literal the model emits once its answer is complete
pub const END_OF_ANSWER: &str = "<END_OF_ANSWER>";

/// Follow-up requests allowed after the first completion call
pub const DEFAULT_MAX_CONTINUATIONS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<ChunkMetadata>,
    pub confidence: f64,
}

/// Append-only message history.
///
/// Extending a conversation returns a new value and leaves the original intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    #[inline]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    #[inline]
    #[must_use]
    pub fn with(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        Self { messages }
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
    max_continuations: usize,
}

impl AnswerSynthesizer {
    #[inline]
    pub fn new(client: Arc<dyn CompletionClient>, max_continuations: usize) -> Self {
        Self {
            client,
            max_continuations,
        }
    }

    #[inline]
    pub fn completion_model(&self) -> &str {
        self.client.model_id()
    }

    /// Answer `question` from `context`.
    ///
    /// Makes at most `max_continuations + 1` completion calls. A transport
    /// failure on any call, or an empty first response, fails the whole answer.
    #[inline]
    pub fn synthesize(&self, question: &str, context: &[RetrievedChunk]) -> Result<Answer> {
        let mut conversation = Conversation::new(
            prompt::system_prompt(),
            prompt::user_prompt(question, context),
        );

        let response = self.client.complete(conversation.messages())?;
        let first = response
            .first_choice()
            .ok_or(RagError::Completion(CompletionError::EmptyChoices))?;

        let mut answer = first.content().to_string();
        let mut finish_reason = first.finish_reason.clone();
        info!("Initial finish_reason={:?}", finish_reason);

        let mut continuations = 0;
        while needs_continuation(&answer, finish_reason.as_deref()) {
            if continuations >= self.max_continuations {
                warn!(
                    "Reached max continuations ({}) without {}",
                    self.max_continuations, END_OF_ANSWER
                );
                break;
            }
            continuations += 1;
            info!("Continuation attempt {}", continuations);

            conversation = conversation
                .with(Message::assistant(answer.as_str()))
                .with(Message::user(prompt::continue_prompt()));

            let response = self.client.complete(conversation.messages())?;
            let Some(choice) = response.first_choice() else {
                warn!(
                    "Completion returned no choices during continuation {}, keeping partial answer",
                    continuations
                );
                break;
            };

            answer.push('\n');
            answer.push_str(choice.content());
            finish_reason = choice.finish_reason.clone();
            info!(
                "Continuation {} finish_reason={:?}",
                continuations, finish_reason
            );
        }

        let answer = strip_sentinel(&answer);
        let distances: Vec<f32> = context.iter().map(|c| c.distance).collect();
        let confidence = confidence(&distances);
        debug!(
            "Synthesized {} chars after {} continuations, confidence {}",
            answer.len(),
            continuations,
            confidence
        );

        Ok(Answer {
            answer,
            sources: context.iter().map(|c| c.metadata.clone()).collect(),
            confidence,
        })
    }
}

fn needs_continuation(answer: &str, finish_reason: Option<&str>) -> bool {
    finish_reason == Some(crate::completion::FINISH_REASON_LENGTH)
        || !answer.trim_end().ends_with(END_OF_ANSWER)
}

/// Remove every sentinel occurrence and surrounding whitespace
#[inline]
pub fn strip_sentinel(answer: &str) -> String {
    answer.replace(END_OF_ANSWER, "").trim().to_string()
}

/// `1 / (1 + mean distance)` rounded to two decimals; `0.0` without context
#[inline]
pub fn confidence(distances: &[f32]) -> f64 {
    if distances.is_empty() {
        return 0.0;
    }
    let mean = distances.iter().map(|&d| f64::from(d)).sum::<f64>() / distances.len() as f64;
    let raw = 1.0 / (1.0 + mean);
    (raw * 100.0).round() / 100.0
}
