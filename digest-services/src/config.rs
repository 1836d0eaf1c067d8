//! Digest configuration
//!
//! All settings come from the process environment. Credentials are optional:
//! without them the pipeline still runs and degrades to empty pages or
//! fallback summaries.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use digest_news::{
    NewsSearchClient, NewsSearchConfig, RetryPolicy, RetryingHttpClient,
    DEFAULT_RETRY_STATUS_CODES,
};
use digest_summarizer::{ChatCompletionClient, ChatCompletionConfig, SummaryBackend};

use crate::summarization::SummarizationConfig;

/// How the front page picks its articles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontPageMode {
    /// Scan pages from the first one, keeping only today's and yesterday's items
    #[default]
    RecencyScan,
    /// Render one randomly chosen page
    RandomPage,
}

impl FromStr for FrontPageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recency" => Ok(FrontPageMode::RecencyScan),
            "random" => Ok(FrontPageMode::RandomPage),
            other => Err(format!("unknown front page mode '{}'", other)),
        }
    }
}

/// Configuration for the whole digest pipeline
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// News search endpoint, credential and query shape
    pub news: NewsSearchConfig,
    /// Chat-completion credential; `None` means fallback summaries only
    pub summary_api_key: Option<String>,
    pub summary_endpoint: String,
    pub summary_model: String,
    /// How long a fetched page stays valid
    pub cache_ttl: Duration,
    pub max_retries: u32,
    /// Base of the exponential backoff schedule
    pub backoff_factor: Duration,
    pub retry_status_codes: Vec<u16>,
    /// Maximum in-flight summarization calls
    pub summary_concurrency: usize,
    /// Wall-clock budget for one summarization batch
    pub summary_deadline: Duration,
    /// Per-request network timeout
    pub http_timeout: Duration,
    pub front_page_mode: FrontPageMode,
}

impl Default for DigestConfig {
    fn default() -> Self {
        let chat = ChatCompletionConfig::new("");
        Self {
            news: NewsSearchConfig::default(),
            summary_api_key: None,
            summary_endpoint: chat.endpoint,
            summary_model: chat.model,
            cache_ttl: Duration::from_secs(900),
            max_retries: 2,
            backoff_factor: Duration::from_millis(500),
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.to_vec(),
            summary_concurrency: 3,
            summary_deadline: Duration::from_secs(10),
            http_timeout: Duration::from_secs(10),
            front_page_mode: FrontPageMode::default(),
        }
    }
}

impl DigestConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - GNEWS_API_KEY, GNEWS_API_URL, NEWS_TOPIC, NEWS_LANGUAGE, NEWS_PAGE_SIZE
    /// - OPENROUTER_API_KEY, OPENROUTER_API_URL, SUMMARY_MODEL
    /// - CACHE_TTL_SECS, MAX_RETRIES, BACKOFF_FACTOR, RETRY_STATUS_CODES
    /// - SUMMARIZE_BATCH_SIZE, MAX_SUMMARY_TIME, HTTP_TIMEOUT_SECS, FRONT_PAGE_MODE
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let news = NewsSearchConfig {
            endpoint: value("GNEWS_API_URL").unwrap_or(defaults.news.endpoint),
            api_key: value("GNEWS_API_KEY"),
            topic: value("NEWS_TOPIC").unwrap_or(defaults.news.topic),
            language: value("NEWS_LANGUAGE").unwrap_or(defaults.news.language),
            page_size: parse_or("NEWS_PAGE_SIZE", value("NEWS_PAGE_SIZE"), defaults.news.page_size)?,
        };

        let retry_status_codes = match value("RETRY_STATUS_CODES") {
            Some(raw) => parse_status_codes(&raw)?,
            None => defaults.retry_status_codes,
        };

        let backoff_factor = match value("BACKOFF_FACTOR") {
            Some(raw) => parse_seconds("BACKOFF_FACTOR", &raw)?,
            None => defaults.backoff_factor,
        };

        let summary_concurrency: usize = parse_or(
            "SUMMARIZE_BATCH_SIZE",
            value("SUMMARIZE_BATCH_SIZE"),
            defaults.summary_concurrency,
        )?;
        if summary_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SUMMARIZE_BATCH_SIZE".to_string(),
                error: "must be at least 1".to_string(),
            });
        }

        let front_page_mode = match value("FRONT_PAGE_MODE") {
            Some(raw) => raw.parse().map_err(|error| ConfigError::InvalidValue {
                field: "FRONT_PAGE_MODE".to_string(),
                error,
            })?,
            None => defaults.front_page_mode,
        };

        Ok(Self {
            news,
            summary_api_key: value("OPENROUTER_API_KEY"),
            summary_endpoint: value("OPENROUTER_API_URL").unwrap_or(defaults.summary_endpoint),
            summary_model: value("SUMMARY_MODEL").unwrap_or(defaults.summary_model),
            cache_ttl: Duration::from_secs(parse_or(
                "CACHE_TTL_SECS",
                value("CACHE_TTL_SECS"),
                defaults.cache_ttl.as_secs(),
            )?),
            max_retries: parse_or("MAX_RETRIES", value("MAX_RETRIES"), defaults.max_retries)?,
            backoff_factor,
            retry_status_codes,
            summary_concurrency,
            summary_deadline: Duration::from_secs(parse_or(
                "MAX_SUMMARY_TIME",
                value("MAX_SUMMARY_TIME"),
                defaults.summary_deadline.as_secs(),
            )?),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                value("HTTP_TIMEOUT_SECS"),
                defaults.http_timeout.as_secs(),
            )?),
            front_page_mode,
        })
    }

    /// Retry policy for the news search upstream
    pub fn news_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.backoff_factor,
            self.retry_status_codes.iter().copied(),
        )
    }

    pub fn news_client(&self) -> NewsSearchClient {
        let http = RetryingHttpClient::new("news", self.news_retry_policy(), self.http_timeout);
        NewsSearchClient::new(self.news.clone(), http)
    }

    /// Chat-completion backend, or `None` without a credential.
    ///
    /// The client sends one HTTP attempt per call; the engine owns the
    /// per-item attempt budget.
    pub fn summary_backend(&self) -> Option<Arc<dyn SummaryBackend>> {
        let api_key = self.summary_api_key.as_deref().filter(|key| !key.is_empty())?;
        let chat = ChatCompletionConfig {
            endpoint: self.summary_endpoint.clone(),
            model: self.summary_model.clone(),
            ..ChatCompletionConfig::new(api_key)
        };
        let http = RetryingHttpClient::new(
            "summarizer",
            RetryPolicy::single_attempt(),
            self.http_timeout,
        );
        Some(Arc::new(ChatCompletionClient::new(chat, http)))
    }

    /// Engine settings: `max_retries` attempts per item (at least one)
    pub fn summarization(&self) -> SummarizationConfig {
        SummarizationConfig {
            concurrency: self.summary_concurrency,
            retry: RetryPolicy::new(self.max_retries.saturating_sub(1), self.backoff_factor, []),
            deadline: Some(self.summary_deadline),
        }
    }
}

fn parse_or<T: FromStr>(field: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: field.to_string(),
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_seconds(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |error: String| ConfigError::InvalidValue {
        field: field.to_string(),
        error,
    };
    let secs: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
    let duration = Duration::try_from_secs_f64(secs).map_err(|e| invalid(e.to_string()))?;
    // A zero base would flatten the backoff schedule
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}

fn parse_status_codes(raw: &str) -> Result<Vec<u16>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                field: "RETRY_STATUS_CODES".to_string(),
                error: format!("'{}': {}", code, e),
            })
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {error}")]
    InvalidValue { field: String, error: String },
}
