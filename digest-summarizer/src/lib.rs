//! Summarization for the news digest
//!
//! This crate provides the chat-completion client that produces short
//! article summaries, the `SummaryBackend` seam it implements, and the
//! deterministic truncation used whenever generation is unavailable.

pub mod backend;
pub mod chat;
pub mod fallback;
pub mod types;

pub use backend::SummaryBackend;
pub use chat::{ChatCompletionClient, ChatCompletionConfig};
pub use fallback::{FallbackSummarizer, FALLBACK_MAX_CHARS};
