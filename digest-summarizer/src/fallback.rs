//! Deterministic summary used when generation is unavailable

/// Longest fallback text kept before truncation, in characters
pub const FALLBACK_MAX_CHARS: usize = 120;

const ELLIPSIS: &str = "...";

/// Truncating summarizer. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSummarizer;

impl FallbackSummarizer {
    /// `text` unchanged when it fits, else its first 120 characters plus "..."
    pub fn fallback(text: &str) -> String {
        match text.char_indices().nth(FALLBACK_MAX_CHARS) {
            Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
            None => text.to_string(),
        }
    }
}
