//! News Fetcher
//!
//! Serves article pages from the `PageCache`, falling back to the upstream
//! search API on a miss. Upstream failures never reach the caller of
//! `fetch_page`: they are logged and turned into an empty page.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, error, info, instrument, warn};

use digest_core::RawItem;
use digest_news::{FailureKind, NewsSearchClient, UpstreamError};

use crate::page_cache::{Page, PageCache};

/// Whether `item` was published on `reference` or the day before it
pub fn is_recent(item: &RawItem, reference: NaiveDate) -> bool {
    let Some(published) = item.published_date() else {
        return false;
    };
    let yesterday = reference.checked_sub_days(Days::new(1));
    published == reference || Some(published) == yesterday
}

/// Cache-or-fetch access to upstream article pages
#[derive(Debug, Clone)]
pub struct NewsFetcher {
    client: NewsSearchClient,
    cache: Arc<PageCache>,
}

impl NewsFetcher {
    pub fn new(client: NewsSearchClient, cache: Arc<PageCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Articles for `page`, empty when the upstream is unavailable.
    ///
    /// Page 0 is read as page 1.
    pub async fn fetch_page(&self, page: u32) -> Page {
        match self.try_fetch_page(page).await {
            Ok(items) => items,
            Err(e) => {
                match e.kind() {
                    FailureKind::Config => error!("News search unavailable: {}", e),
                    _ => error!("News search failed for page {}: {}", page, e),
                }
                Arc::new(Vec::new())
            }
        }
    }

    /// Same as `fetch_page`, but reports the classified failure.
    ///
    /// Only non-empty pages are cached, so an empty upstream answer is
    /// asked for again on the next call.
    #[instrument(skip(self))]
    pub async fn try_fetch_page(&self, page: u32) -> Result<Page, UpstreamError> {
        let page = page.max(1);

        if let Some(items) = self.cache.get(page) {
            return Ok(items);
        }

        let items = Arc::new(self.client.search_page(page).await?);

        if items.is_empty() {
            warn!("No articles found for page {}", page);
        } else {
            self.cache.put(page, Arc::clone(&items));
            info!("Fetched {} news articles (page {})", items.len(), page);
        }

        Ok(items)
    }

    /// Collect recent articles by scanning pages `1..=max_pages` in order.
    ///
    /// Stops as soon as at least `target` recent items are gathered; empty
    /// or failed pages are skipped.
    #[instrument(skip(self))]
    pub async fn fetch_recent(
        &self,
        reference: NaiveDate,
        target: usize,
        max_pages: u32,
    ) -> Vec<RawItem> {
        let mut combined = Vec::new();
        let mut scanned = 0;

        for page in 1..=max_pages {
            scanned = page;
            let items = self.fetch_page(page).await;
            if items.is_empty() {
                continue;
            }

            combined.extend(
                items
                    .iter()
                    .filter(|item| is_recent(item, reference))
                    .cloned(),
            );

            if combined.len() >= target {
                break;
            }
        }

        debug!(
            "Collected {} recent articles (pages checked up to {})",
            combined.len(),
            scanned
        );
        combined
    }
}
