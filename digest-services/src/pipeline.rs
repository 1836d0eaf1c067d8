//! News Pipeline
//!
//! Turns page requests into display-ready news cards: fetch (cache-or-upstream),
//! keep the first few articles, summarize them as one batch, and zip the
//! results back onto the articles.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument};

use digest_core::{DisplayItem, RawItem};
use digest_summarizer::FallbackSummarizer;

use crate::config::{DigestConfig, FrontPageMode};
use crate::news_fetcher::{is_recent, NewsFetcher};
use crate::page_cache::PageCache;
use crate::summarization::SummarizationEngine;

/// Cards rendered per view
pub const MAX_DISPLAY_ITEMS: usize = 8;

/// Pages the front page may draw from
pub const FRONT_PAGE_MAX_PAGES: u32 = 10;

/// Headlines in the breaking-news ticker
pub const TICKER_ITEMS: usize = 5;

const TICKER_SEPARATOR: &str = " | ";

/// Front page content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontPage {
    /// Page the caller continues infinite scrolling from
    pub page: u32,
    pub items: Vec<DisplayItem>,
}

/// Fetch + summarize pipeline owned by the surrounding service
#[derive(Clone)]
pub struct NewsPipeline {
    fetcher: NewsFetcher,
    engine: SummarizationEngine,
    front_page_mode: FrontPageMode,
}

impl NewsPipeline {
    pub fn new(
        fetcher: NewsFetcher,
        engine: SummarizationEngine,
        front_page_mode: FrontPageMode,
    ) -> Self {
        Self {
            fetcher,
            engine,
            front_page_mode,
        }
    }

    /// Build the pipeline with fresh clients and an empty cache
    pub fn from_config(config: &DigestConfig) -> Self {
        info!(
            "Initializing NewsPipeline (news search: {}, summarizer: {}, mode: {:?})",
            config.news.api_key.is_some(),
            config.summary_api_key.is_some(),
            config.front_page_mode
        );
        let cache = Arc::new(PageCache::new(config.cache_ttl));
        let fetcher = NewsFetcher::new(config.news_client(), cache);
        let engine = SummarizationEngine::new(config.summary_backend(), config.summarization());
        Self::new(fetcher, engine, config.front_page_mode)
    }

    pub fn engine(&self) -> &SummarizationEngine {
        &self.engine
    }

    /// Display cards for `page`
    #[instrument(skip(self))]
    pub async fn get_page(&self, page: u32) -> Vec<DisplayItem> {
        let items = self.fetcher.fetch_page(page).await;
        debug!("Fetched {} news items for page {}", items.len(), page);
        self.render(&items).await
    }

    /// Display cards for `page`, limited to recent articles with distinct links
    pub async fn get_recent_page(&self, page: u32) -> Vec<DisplayItem> {
        self.get_recent_page_on(page, Utc::now().date_naive()).await
    }

    /// Same as `get_recent_page`, with "recent" relative to `today`
    #[instrument(skip(self))]
    pub async fn get_recent_page_on(&self, page: u32, today: NaiveDate) -> Vec<DisplayItem> {
        let items = self.fetcher.fetch_page(page).await;
        let filtered = recent_unique(&items, today);
        self.render(&filtered).await
    }

    /// Front page according to the configured mode
    pub async fn front_page(&self) -> FrontPage {
        match self.front_page_mode {
            FrontPageMode::RecencyScan => self.front_page_on(Utc::now().date_naive()).await,
            FrontPageMode::RandomPage => {
                let page = rand::rng().random_range(1..=FRONT_PAGE_MAX_PAGES);
                FrontPage {
                    page,
                    items: self.get_page(page).await,
                }
            }
        }
    }

    /// Front page made of articles published on `today` or the day before
    #[instrument(skip(self))]
    pub async fn front_page_on(&self, today: NaiveDate) -> FrontPage {
        let recent = self
            .fetcher
            .fetch_recent(today, MAX_DISPLAY_ITEMS, FRONT_PAGE_MAX_PAGES)
            .await;
        let items = self.render(&recent).await;
        debug!("Processed {} news items for the front page", items.len());
        FrontPage { page: 1, items }
    }

    /// Headlines of the first page joined for the ticker
    pub async fn ticker(&self) -> String {
        let items = self.fetcher.fetch_page(1).await;
        items
            .iter()
            .take(TICKER_ITEMS)
            .map(RawItem::title)
            .collect::<Vec<_>>()
            .join(TICKER_SEPARATOR)
    }

    /// Summarize the first `MAX_DISPLAY_ITEMS` articles and build their cards
    async fn render(&self, items: &[RawItem]) -> Vec<DisplayItem> {
        let items = &items[..items.len().min(MAX_DISPLAY_ITEMS)];
        let texts: Vec<String> = items
            .iter()
            .map(|item| item.summary_text().to_string())
            .collect();

        let summaries = self.engine.summarize_batch(&texts).await;

        items
            .iter()
            .zip(&texts)
            .enumerate()
            .map(|(index, (item, text))| {
                let summary = summaries
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| FallbackSummarizer::fallback(text));
                DisplayItem::from_raw(item, summary)
            })
            .collect()
    }
}

/// Recent items, keeping the first occurrence of each link.
/// Items without a link are never treated as duplicates.
fn recent_unique(items: &[RawItem], today: NaiveDate) -> Vec<RawItem> {
    let mut seen_urls = HashSet::new();
    items
        .iter()
        .filter(|item| is_recent(item, today))
        .filter(|item| match item.url.as_deref() {
            Some(url) if !url.is_empty() => seen_urls.insert(url.to_string()),
            _ => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::SummarizationConfig;
    use async_trait::async_trait;
    use digest_news::{
        NewsSearchClient, NewsSearchConfig, RetryPolicy, RetryingHttpClient, UpstreamError,
    };
    use digest_summarizer::SummaryBackend;
    use std::time::Duration;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct UppercaseBackend;

    #[async_trait]
    impl SummaryBackend for UppercaseBackend {
        async fn summarize(&self, text: &str) -> Result<String, UpstreamError> {
            Ok(text.to_uppercase())
        }
    }

    fn pipeline(server: &MockServer, backend: Option<Arc<dyn SummaryBackend>>) -> NewsPipeline {
        let http = RetryingHttpClient::new(
            "news",
            RetryPolicy::new(0, Duration::from_millis(1), []),
            Duration::from_secs(5),
        );
        let news = NewsSearchConfig {
            endpoint: format!("{}/search", server.uri()),
            api_key: Some("key".to_string()),
            ..NewsSearchConfig::default()
        };
        let fetcher = NewsFetcher::new(
            NewsSearchClient::new(news, http),
            Arc::new(PageCache::new(Duration::from_secs(60))),
        );
        let engine = SummarizationEngine::new(
            backend,
            SummarizationConfig {
                deadline: None,
                ..SummarizationConfig::default()
            },
        );
        NewsPipeline::new(fetcher, engine, FrontPageMode::RecencyScan)
    }

    fn article(title: &str, description: &str, date: &str, url: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "description": description,
            "content": "",
            "publishedAt": format!("{}T10:00:00Z", date),
            "source": {"name": "Wire", "url": "https://wire.example"},
            "image": format!("{}.png", url),
            "url": url
        })
    }

    async fn mount_page(server: &MockServer, page: u32, articles: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "articles": articles })),
            )
            .mount(server)
            .await;
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_get_page_without_summarizer() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            vec![
                article("First", "GPUs are scarce.", "2026-10-18", "https://n.example/1"),
                serde_json::json!({
                    "title": "No text",
                    "description": "",
                    "content": "",
                    "publishedAt": "2026-10-18T10:00:00Z",
                    "url": "https://n.example/2"
                }),
                article("Third", "Agents ship.", "2026-10-17", "https://n.example/3"),
            ],
        )
        .await;

        let items = pipeline(&server, None).get_page(1).await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].summary, "GPUs are scarce.");
        assert_eq!(items[0].date, "2026-10-18");
        assert_eq!(items[0].source, "Wire");
        assert_eq!(items[0].image, "https://n.example/1.png");
        assert_eq!(items[0].link, "https://n.example/1");
        assert_eq!(items[1].summary, "");
        assert_eq!(items[1].source, "");
        assert_eq!(items[2].summary, "Agents ship.");
    }

    #[tokio::test]
    async fn test_get_page_uses_summaries_and_truncates() {
        let server = MockServer::start().await;
        let articles = (0..10)
            .map(|i| {
                article(
                    &format!("T{}", i),
                    &format!("text {}", i),
                    "2026-10-18",
                    &format!("https://n.example/{}", i),
                )
            })
            .collect();
        mount_page(&server, 2, articles).await;

        let items = pipeline(&server, Some(Arc::new(UppercaseBackend)))
            .get_page(2)
            .await;

        assert_eq!(items.len(), MAX_DISPLAY_ITEMS);
        assert_eq!(items[0].summary, "TEXT 0");
        assert_eq!(items[7].summary, "TEXT 7");
        assert_eq!(items[7].title, "T7");
    }

    #[tokio::test]
    async fn test_upstream_outage_renders_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, Some(Arc::new(UppercaseBackend)));
        assert!(pipeline.get_page(1).await.is_empty());
        assert_eq!(pipeline.ticker().await, "");
    }

    #[tokio::test]
    async fn test_front_page_scans_for_recent_items() {
        let server = MockServer::start().await;
        let old: Vec<_> = (0..4)
            .map(|i| article("Old", "old", "2026-10-01", &format!("https://n.example/old{}", i)))
            .collect();
        let fresh = |prefix: &str| -> Vec<serde_json::Value> {
            (0..5)
                .map(|i| {
                    article(
                        &format!("{}{}", prefix, i),
                        "fresh",
                        "2026-10-17",
                        &format!("https://n.example/{}{}", prefix, i),
                    )
                })
                .collect()
        };
        mount_page(&server, 1, old).await;
        mount_page(&server, 2, fresh("a")).await;
        mount_page(&server, 3, fresh("b")).await;
        Mock::given(method("GET"))
            .and(query_param("page", "4"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let front = pipeline(&server, None).front_page_on(date("2026-10-18")).await;

        assert_eq!(front.page, 1);
        assert_eq!(front.items.len(), MAX_DISPLAY_ITEMS);
        assert_eq!(front.items[0].title, "a0");
        assert_eq!(front.items[5].title, "b0");
        assert!(front.items.iter().all(|item| item.date == "2026-10-17"));
    }

    #[tokio::test]
    async fn test_random_front_page_renders_chosen_page() {
        let server = MockServer::start().await;
        for page in 1..=FRONT_PAGE_MAX_PAGES {
            mount_page(
                &server,
                page,
                vec![article(
                    &format!("P{}", page),
                    "text",
                    "2026-10-01",
                    &format!("https://n.example/p{}", page),
                )],
            )
            .await;
        }

        let mut pipeline = pipeline(&server, None);
        pipeline.front_page_mode = FrontPageMode::RandomPage;

        for _ in 0..5 {
            let front = pipeline.front_page().await;
            assert!((1..=FRONT_PAGE_MAX_PAGES).contains(&front.page));
            assert_eq!(front.items.len(), 1);
            assert_eq!(front.items[0].title, format!("P{}", front.page));
        }
    }

    #[tokio::test]
    async fn test_recent_page_drops_old_and_duplicate_links() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            3,
            vec![
                article("Today", "a", "2026-10-18", "https://n.example/a"),
                article("Old", "b", "2026-10-02", "https://n.example/b"),
                article("Repeat", "c", "2026-10-17", "https://n.example/a"),
                article("Yesterday", "d", "2026-10-17", "https://n.example/d"),
            ],
        )
        .await;

        let items = pipeline(&server, Some(Arc::new(UppercaseBackend)))
            .get_recent_page_on(3, date("2026-10-18"))
            .await;

        let titles: Vec<_> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Today", "Yesterday"]);
        assert_eq!(items[1].summary, "D");
        assert_eq!(items[1].link, "https://n.example/d");
    }

    #[tokio::test]
    async fn test_ticker_joins_first_titles() {
        let server = MockServer::start().await;
        let articles = (0..7)
            .map(|i| article(&format!("H{}", i), "x", "2026-10-18", &format!("https://n.example/{}", i)))
            .collect();
        mount_page(&server, 1, articles).await;

        let ticker = pipeline(&server, None).ticker().await;
        assert_eq!(ticker, "H0 | H1 | H2 | H3 | H4");
    }

    #[test]
    fn test_recent_unique_filters_and_dedupes() {
        let item = |url: Option<&str>, date: &str| RawItem {
            url: url.map(str::to_string),
            published_at: Some(date.to_string()),
            ..RawItem::default()
        };
        let items = vec![
            item(Some("https://n.example/a"), "2026-10-18"),
            item(Some("https://n.example/a"), "2026-10-18"),
            item(None, "2026-10-18"),
            item(None, "2026-10-17"),
            item(Some("https://n.example/b"), "2026-10-10"),
        ];

        let filtered = recent_unique(&items, date("2026-10-18"));
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].url.as_deref(), Some("https://n.example/a"));
        assert!(filtered[1].url.is_none());
    }
}
