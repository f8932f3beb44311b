//! Token counting and cost estimation

use tiktoken_rs::CoreBPE;

/// Price per 1K input tokens, in USD
const PRICING: &[(&str, f64)] = &[
    ("gpt-4o", 0.005),
    ("gpt-4o-mini", 0.00015),
    ("gpt-4-turbo", 0.01),
    ("gpt-3.5-turbo", 0.0015),
];

const FALLBACK_RATE: f64 = 0.002;

/// cl100k special tokens; text containing one is estimated from words
const SPECIAL_TOKENS: &[&str] = &[
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
    "<|endofprompt|>",
];

/// Counts tokens with the cl100k_base encoding
pub struct TokenCounter {
    encoding: Option<CoreBPE>,
}

impl TokenCounter {
    pub fn new() -> Self {
        let encoding = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!("cl100k_base encoding unavailable, estimating from words: {}", e);
                None
            }
        };
        Self { encoding }
    }

    /// Counter that always uses the word-based estimate
    pub fn approximate() -> Self {
        Self { encoding: None }
    }

    /// Count tokens in text
    pub fn count(&self, text: &str) -> usize {
        match &self.encoding {
            Some(_) if SPECIAL_TOKENS.iter().any(|special| text.contains(special)) => {
                tracing::debug!("Special token in prompt, estimating from words");
                estimate_from_words(text)
            }
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => estimate_from_words(text),
        }
    }

    /// Estimate cost in USD for a token count
    pub fn estimate_cost(&self, token_count: usize, model: &str) -> f64 {
        let rate = PRICING
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, rate)| *rate)
            .unwrap_or(FALLBACK_RATE);
        (token_count as f64 / 1000.0) * rate
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

fn estimate_from_words(text: &str) -> usize {
    (text.split_whitespace().count() as f64 * 1.3) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("hello world"), 2);
    }

    #[test]
    fn test_special_tokens_use_word_estimate() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count("summarize <|endoftext|> this"), 3);
        assert_eq!(counter.count("a <|fim_prefix|> b c d e f g h i"), 13);
    }

    #[test]
    fn test_word_estimate() {
        let counter = TokenCounter::approximate();
        assert_eq!(counter.count("one two three four five six seven eight nine ten"), 13);
    }

    #[test]
    fn test_estimate_cost() {
        let counter = TokenCounter::approximate();
        assert!((counter.estimate_cost(1000, "gpt-4o-mini") - 0.00015).abs() < 1e-12);
        assert!((counter.estimate_cost(2000, "unknown-model") - 0.004).abs() < 1e-12);
    }
}
