//! Wire types for the news search API

use serde::Serialize;

/// Query string of a search request
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery<'a> {
    /// Topic filter
    pub query: &'a str,
    /// Language code (e.g., "en")
    pub language: &'a str,
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
    /// Articles per page
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    /// 1-based page number
    pub page: u32,
}
