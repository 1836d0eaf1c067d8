//! Summary generation seam

use async_trait::async_trait;
use digest_news::UpstreamError;

/// A service that turns article text into a short summary.
///
/// Each call is a single attempt; retries and fallback belong to the caller.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, UpstreamError>;
}
