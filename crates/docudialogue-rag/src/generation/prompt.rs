//! System prompt templates for document-grounded chat

use crate::retrieval::ContextBlock;

/// Assembles the system instruction for a conversation turn.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the grounded system prompt around retrieved context.
    ///
    /// The retrieved passages are interpolated verbatim. When no context was
    /// found the prompt still instructs the model to say so instead of
    /// fabricating an answer.
    pub fn build_system_prompt(context: &ContextBlock) -> String {
        match context {
            ContextBlock::Found(passages) => format!(
                "{PREAMBLE}\n\n\
                 Use the following context to answer the question, and if the \
                 context doesn't contain the answer, say so:\n\n{passages}"
            ),
            ContextBlock::Empty => format!(
                "{PREAMBLE}\n\n\
                 No relevant context was found in the uploaded documents for \
                 this question. Tell the user that no relevant context was \
                 found and do not invent document content."
            ),
        }
    }
}

const PREAMBLE: &str = "\
You are a versatile, contextually aware assistant for document question \
answering. You process a broad range of reference material (PDF extracts, \
text snippets, tables) and produce accurate, clearly presented answers.

When answering financial questions, draw on the provided references for \
grounded, verifiable figures, and contextualize them against the broader \
scenario. Summaries should be logically structured, prioritizing the most \
valuable data points without omitting details that shape understanding.

Format for clarity: use well-labeled tables when data lends itself to \
comparison, and headings or bullet points for textual explanations. Handle \
follow-up questions in a way that integrates with previously provided \
context, staying consistent with earlier answers.";
