use crate::token_counter::TokenEstimate;

/// Default context size of the summarization model
pub const DEFAULT_MAX_MODEL_TOKENS: usize = 126_000;
/// Tokens held back for the instruction prompt and the reply
pub const DEFAULT_RESERVED_TOKENS: usize = 1_000;

/// Split document text into chunks that each fit the model's budget.
///
/// Words are packed greedily: a chunk grows until the next word would push it past
/// `max_model_tokens - reserved_tokens`, then a new chunk starts. Joining the chunks
/// with a single space gives back the whitespace-normalized input. A word that alone
/// exceeds the budget becomes a chunk of its own.
pub fn chunk_text(
    content: &str,
    max_model_tokens: usize,
    reserved_tokens: usize,
    estimate: TokenEstimate,
) -> Vec<String> {
    let max_tokens = max_model_tokens.saturating_sub(reserved_tokens);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_length = 0;

    for word in content.split_whitespace() {
        let word_length = estimate.word_cost(word);
        if !current.is_empty() && current_length + word_length > max_tokens {
            chunks.push(current.join(" "));
            current.clear();
            current_length = 0;
        }
        current.push(word);
        current_length += word_length;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
