//! Size- and token-bounded batching of input texts.

/// Estimated token count of a text: its length in UTF-16 code units divided
/// by the average characters per token.
pub fn estimate_tokens(text: &str, avg_chars_per_token: f64) -> f64 {
    text.encode_utf16().count() as f64 / avg_chars_per_token
}

/// Split `inputs` into ordered batches.
///
/// A batch is flushed when it already holds `batch_size` texts, or when
/// adding the next text would bring the running token estimate to or above
/// `batch_token_limit`. A text whose own estimate meets the limit is never
/// split; it lands alone in its own batch. Concatenating the output yields
/// `inputs` unchanged.
pub fn generate_batches(
    inputs: &[String],
    batch_size: usize,
    batch_token_limit: f64,
    avg_chars_per_token: f64,
) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut tokens = 0.0;

    for text in inputs {
        if current.len() >= batch_size {
            batches.push(std::mem::take(&mut current));
            tokens = 0.0;
        }
        let estimate = estimate_tokens(text, avg_chars_per_token);
        if tokens + estimate >= batch_token_limit && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            tokens = 0.0;
        }
        current.push(text.clone());
        tokens += estimate;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
