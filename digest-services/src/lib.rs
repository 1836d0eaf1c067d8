//! Business logic services for the AI news digest
//!
//! This crate turns a page request into display-ready news cards:
//! `NewsFetcher` serves pages from a TTL `PageCache` or the upstream search
//! API, `SummarizationEngine` enriches the article texts concurrently, and
//! `NewsPipeline` ties both together for the rendering layer.

pub mod config;
pub mod news_fetcher;
pub mod page_cache;
pub mod pipeline;
pub mod summarization;

pub use config::{ConfigError, DigestConfig, FrontPageMode};
pub use news_fetcher::{is_recent, NewsFetcher};
pub use page_cache::{Page, PageCache};
pub use pipeline::{FrontPage, NewsPipeline};
pub use summarization::{SummarizationConfig, SummarizationEngine, SummaryOutcome, SummaryResult};
