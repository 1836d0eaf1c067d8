//! Upstream clients for the news digest
//!
//! This crate provides:
//! - `RetryingHttpClient`: pooled HTTP client with bounded retry and exponential backoff
//! - `NewsSearchClient`: paginated article search against the news API
//! - `UpstreamError`: the failure taxonomy shared by every outbound call

pub mod error;
pub mod retry;
pub mod search;
pub mod types;

pub use error::{FailureKind, UpstreamError};
pub use retry::{RetryPolicy, RetryingHttpClient, DEFAULT_RETRY_STATUS_CODES};
pub use search::{NewsSearchClient, NewsSearchConfig};
pub use types::SearchQuery;
