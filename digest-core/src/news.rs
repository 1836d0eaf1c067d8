//! News data structures for the digest
//!
//! `RawItem` mirrors one article of the upstream search response. Every field
//! is optional and decoded leniently: a field with an unexpected JSON type is
//! read as absent instead of rejecting the whole article.

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// Source of a news article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Name of the publication (e.g., "Reuters")
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Publication homepage
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// An article as returned by the news search endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    /// ISO-8601 publication timestamp
    #[serde(rename = "publishedAt", default, deserialize_with = "lenient")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<SourceRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl RawItem {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Text to summarize: the description, else the content, else nothing.
    pub fn summary_text(&self) -> &str {
        [self.description.as_deref(), self.content.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Calendar date of publication, read from the first 10 characters of
    /// `publishedAt`.
    pub fn published_date(&self) -> Option<NaiveDate> {
        let raw = self.published_at.as_deref()?;
        let prefix: String = raw.chars().take(10).collect();
        NaiveDate::parse_from_str(&prefix, "%Y-%m-%d").ok()
    }

    /// `YYYY-MM-DD`, or empty when the timestamp is missing or malformed.
    pub fn display_date(&self) -> String {
        self.published_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn source_label(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|source| source.name.as_deref())
            .unwrap_or_default()
    }
}

/// A display-ready news card consumed by the rendering layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub title: String,
    /// Generated summary, or the truncated fallback
    pub summary: String,
    /// Publication date (`YYYY-MM-DD`), empty when unknown
    pub date: String,
    /// Publication name, empty when unknown
    pub source: String,
    pub image: String,
    pub link: String,
}

impl DisplayItem {
    pub fn from_raw(item: &RawItem, summary: String) -> Self {
        Self {
            title: item.title().to_string(),
            summary,
            date: item.display_date(),
            source: item.source_label().to_string(),
            image: item.image.clone().unwrap_or_default(),
            link: item.url.clone().unwrap_or_default(),
        }
    }
}

/// Decode a field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
