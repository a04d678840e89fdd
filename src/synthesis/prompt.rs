// Prompt text for grounded answering

use itertools::Itertools;

use crate::retrieval::RetrievedChunk;
use crate::synthesis::END_OF_ANSWER;

/// Instruction sent as the system turn of every conversation
#[inline]
pub fn system_prompt() -> String {
    format!(
        "You are a knowledge assistant for the AIKosh catalogue of datasets, AI models, \
toolkits, articles, tutorials and use cases.

Answer using only the reference material supplied with the question. Cover every \
relevant resource it mentions, give a short description of each, and explain how \
they relate when that helps the reader.

Rules:
- Name resources in **bold** and use bullet points for lists.
- Never describe resources, features or numbers that the reference material does not contain.
- Do not include code, tables, or remarks about how the material was retrieved.
- Do not stop part way through a list or explanation.
- When the answer is complete, finish with {END_OF_ANSWER} on its own line, and only then.
- If nothing relevant is available, reply \"No relevant information found.\" followed by {END_OF_ANSWER}."
    )
}

/// The user turn: reference material followed by the question, verbatim
#[inline]
pub fn user_prompt(question: &str, context: &[RetrievedChunk]) -> String {
    format!(
        "First find every relevant resource in the reference material, then write a \
complete, structured answer. Finish with {END_OF_ANSWER} on its own line.

Reference material:
{}

Question:
{}",
        render_context(context),
        question
    )
}

/// Sent after a truncated or unterminated reply
#[inline]
pub fn continue_prompt() -> String {
    format!(
        "Continue your previous answer exactly where it stopped, without repeating \
anything already written. Keep going until you reach {END_OF_ANSWER}."
    )
}

/// Context blocks as `**TYPE**:\n<text>`, separated by blank lines
#[inline]
pub fn render_context(context: &[RetrievedChunk]) -> String {
    context
        .iter()
        .map(|chunk| format!("**{}**:\n{}", chunk.metadata.kind.to_uppercase(), chunk.text))
        .join("\n\n")
}
