//! Summarization Engine
//!
//! Enriches a batch of article texts with generated summaries. Calls run
//! concurrently up to a fixed limit; every item owns its retry budget and
//! resolves to the truncation fallback on failure, so one slow or broken
//! call never affects the rest of the batch. Results keep input order.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use digest_news::{FailureKind, RetryPolicy};
use digest_summarizer::{FallbackSummarizer, SummaryBackend};

/// Configuration for the summarization engine
#[derive(Debug, Clone)]
pub struct SummarizationConfig {
    /// Maximum in-flight summarization calls
    pub concurrency: usize,
    /// Attempt budget and backoff schedule per item
    pub retry: RetryPolicy,
    /// Batch deadline; items still pending when it passes fall back
    pub deadline: Option<Duration>,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry: RetryPolicy::new(1, Duration::from_millis(500), []),
            deadline: Some(Duration::from_secs(10)),
        }
    }
}

/// How a summary was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Returned by the summarization service
    Generated,
    /// Input was empty; no call issued
    Empty,
    /// Service unavailable or failing; truncated input used
    Fallback(FailureKind),
    /// Batch deadline passed before the item finished
    DeadlineExceeded,
    /// The item's task aborted
    TaskFailed,
}

impl SummaryOutcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, SummaryOutcome::Generated | SummaryOutcome::Empty)
    }
}

/// Summary for the input text at `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub index: usize,
    pub summary: String,
    pub outcome: SummaryOutcome,
}

/// Bounded-concurrency batch summarizer with graceful degradation
#[derive(Clone)]
pub struct SummarizationEngine {
    backend: Option<Arc<dyn SummaryBackend>>,
    config: SummarizationConfig,
}

impl SummarizationEngine {
    /// Create an engine; without a backend every summary is the fallback
    pub fn new(backend: Option<Arc<dyn SummaryBackend>>, config: SummarizationConfig) -> Self {
        Self { backend, config }
    }

    /// Summaries aligned with `texts`
    pub async fn summarize_batch(&self, texts: &[String]) -> Vec<String> {
        self.summarize_batch_detailed(texts)
            .await
            .into_iter()
            .map(|result| result.summary)
            .collect()
    }

    /// Summarize a single text with the same per-item logic as the batch path
    pub async fn summarize_one(&self, text: &str) -> String {
        self.summarize_batch(&[text.to_string()])
            .await
            .pop()
            .unwrap_or_default()
    }

    /// Summaries aligned with `texts`, each tagged with how it was produced
    #[instrument(skip(self, texts), fields(batch = texts.len()))]
    pub async fn summarize_batch_detailed(&self, texts: &[String]) -> Vec<SummaryResult> {
        let deadline = self.config.deadline.map(|budget| Instant::now() + budget);
        let mut results: Vec<SummaryResult> = texts
            .iter()
            .enumerate()
            .map(|(index, _)| SummaryResult {
                index,
                summary: String::new(),
                outcome: SummaryOutcome::Empty,
            })
            .collect();

        let pending: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(index, text)| (index, text.clone()))
            .collect();

        if pending.is_empty() {
            return results;
        }

        let total = pending.len();
        let completed: Vec<(usize, String, SummaryOutcome)> = stream::iter(pending)
            .map(|(index, text)| {
                let engine = self.clone();
                async move {
                    let task_text = text.clone();
                    let handle =
                        tokio::spawn(async move { engine.summarize_item(&task_text, deadline).await });
                    match handle.await {
                        Ok((summary, outcome)) => (index, summary, outcome),
                        Err(e) => {
                            error!("Summarization task for item {} failed: {}", index, e);
                            (index, FallbackSummarizer::fallback(&text), SummaryOutcome::TaskFailed)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut degraded = 0;
        for (index, summary, outcome) in completed {
            if outcome.is_fallback() {
                degraded += 1;
            }
            results[index] = SummaryResult {
                index,
                summary,
                outcome,
            };
        }

        info!(
            "Summarized {} texts ({} generated, {} fallback)",
            total,
            total - degraded,
            degraded
        );
        results
    }

    /// Per-item path: credential check, bounded attempts, fallback, deadline
    async fn summarize_item(&self, text: &str, deadline: Option<Instant>) -> (String, SummaryOutcome) {
        let Some(deadline) = deadline else {
            return self.summarize_with_retries(text).await;
        };

        if Instant::now() >= deadline {
            return (FallbackSummarizer::fallback(text), SummaryOutcome::DeadlineExceeded);
        }

        match tokio::time::timeout_at(deadline, self.summarize_with_retries(text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Summarization deadline passed, using fallback");
                (FallbackSummarizer::fallback(text), SummaryOutcome::DeadlineExceeded)
            }
        }
    }

    async fn summarize_with_retries(&self, text: &str) -> (String, SummaryOutcome) {
        if text.is_empty() {
            return (String::new(), SummaryOutcome::Empty);
        }

        let Some(backend) = self.backend.as_ref() else {
            warn!("Summarization API key is not configured");
            return (
                FallbackSummarizer::fallback(text),
                SummaryOutcome::Fallback(FailureKind::Config),
            );
        };

        let max_attempts = self.config.retry.max_attempts();
        let mut last_failure = FailureKind::Transport;

        for attempt in 1..=max_attempts {
            match backend.summarize(text).await {
                Ok(summary) => {
                    debug!("Summary generated on attempt {}/{}", attempt, max_attempts);
                    return (summary, SummaryOutcome::Generated);
                }
                Err(e) => {
                    warn!(
                        "Failed to get summary (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                    last_failure = e.kind();
                    if last_failure == FailureKind::Config {
                        break;
                    }
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry.backoff_for(attempt)).await;
                    }
                }
            }
        }

        (
            FallbackSummarizer::fallback(text),
            SummaryOutcome::Fallback(last_failure),
        )
    }
}
