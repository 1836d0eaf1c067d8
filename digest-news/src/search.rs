//! News search API client
//!
//! Issues one paginated search per call through a `RetryingHttpClient` and
//! decodes the `articles` array of the response.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use digest_core::RawItem;

use crate::error::UpstreamError;
use crate::retry::RetryingHttpClient;
use crate::types::SearchQuery;

/// Connection settings for the news search endpoint
#[derive(Debug, Clone)]
pub struct NewsSearchConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// API credential; `None` disables outbound calls
    pub api_key: Option<String>,
    /// Topic filter sent as `query`
    pub topic: String,
    /// Language code sent as `language`
    pub language: String,
    /// Articles requested per page
    pub page_size: u32,
}

impl Default for NewsSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://gnews.io/api/v4/search".to_string(),
            api_key: None,
            topic: "artificial intelligence".to_string(),
            language: "en".to_string(),
            page_size: 10,
        }
    }
}

/// News search API client
#[derive(Debug, Clone)]
pub struct NewsSearchClient {
    http: RetryingHttpClient,
    config: NewsSearchConfig,
}

impl NewsSearchClient {
    pub fn new(config: NewsSearchConfig, http: RetryingHttpClient) -> Self {
        Self { http, config }
    }

    /// Whether a credential is available
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Fetch one page of articles
    #[instrument(skip(self))]
    pub async fn search_page(&self, page: u32) -> Result<Vec<RawItem>, UpstreamError> {
        let api_key = self
            .api_key()
            .ok_or_else(|| UpstreamError::Config("news API key is not configured".to_string()))?;

        let query = SearchQuery {
            query: &self.config.topic,
            language: &self.config.language,
            api_key,
            page_size: self.config.page_size,
            page,
        };

        let request = self
            .http
            .client()
            .get(&self.config.endpoint)
            .query(&query)
            .build()
            .map_err(|e| UpstreamError::Config(format!("invalid search request: {}", e)))?;

        debug!("Searching news: topic='{}', page={}", self.config.topic, page);
        let body: Value = self.http.execute_json(request).await?;

        let articles = parse_articles(body)?;
        info!("Received {} articles for page {}", articles.len(), page);
        Ok(articles)
    }
}

/// Extract the `articles` array from a search response body.
///
/// A body that is not an object, or whose `articles` is not an array, is
/// malformed. A missing `articles` field is an empty page. Individual
/// entries that are not objects are skipped.
pub fn parse_articles(body: Value) -> Result<Vec<RawItem>, UpstreamError> {
    let mut object = match body {
        Value::Object(object) => object,
        other => {
            return Err(UpstreamError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };

    let entries = match object.remove("articles") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(UpstreamError::MalformedResponse(format!(
                "`articles` should be an array, got {}",
                json_type(&other)
            )))
        }
    };

    let items = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<RawItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed article at index {}: {}", index, e);
                None
            }
        })
        .collect();

    Ok(items)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
