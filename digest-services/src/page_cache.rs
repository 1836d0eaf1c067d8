//! Page Cache
//!
//! In-memory TTL store mapping a page number to the articles fetched for it.
//! Expired entries are ignored on read and replaced by the next successful
//! fetch; nothing sweeps them in the background.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use digest_core::RawItem;

/// Shared, read-only snapshot of one fetched page
pub type Page = Arc<Vec<RawItem>>;

/// Cached page with insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    items: Page,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Keyed TTL cache of fetched pages
#[derive(Debug)]
pub struct PageCache {
    ttl: Duration,
    entries: RwLock<HashMap<u32, CacheEntry>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached page, if present and younger than the TTL
    pub fn get(&self, page: u32) -> Option<Page> {
        let entries = self.entries.read();
        let entry = entries.get(&page)?;
        if entry.is_fresh(self.ttl) {
            debug!("Returning cached news for page {}", page);
            Some(Arc::clone(&entry.items))
        } else {
            None
        }
    }

    /// Store `items` for `page`, replacing any previous entry and its timestamp
    pub fn put(&self, page: u32, items: Page) {
        self.entries.write().insert(
            page,
            CacheEntry {
                items,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(titles: &[&str]) -> Page {
        Arc::new(
            titles
                .iter()
                .map(|t| RawItem {
                    title: Some(t.to_string()),
                    ..RawItem::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_get_returns_shared_snapshot() {
        let cache = PageCache::new(Duration::from_secs(60));
        let items = page(&["a", "b"]);
        cache.put(1, Arc::clone(&items));

        let cached = cache.get(1).expect("entry should be fresh");
        assert!(Arc::ptr_eq(&cached, &items));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_expired_entry_is_absent_but_kept() {
        let cache = PageCache::new(Duration::ZERO);
        cache.put(1, page(&["a"]));

        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_entry() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.put(3, page(&["old"]));
        cache.put(3, page(&["new", "newer"]));

        let cached = cache.get(3).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].title(), "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = PageCache::new(Duration::from_millis(30));
        cache.put(1, page(&["a"]));
        assert!(cache.get(1).is_some());

        std::thread::sleep(Duration::from_millis(50));
        assert!(cache.get(1).is_none());

        cache.put(1, page(&["b"]));
        assert_eq!(cache.get(1).unwrap()[0].title(), "b");
    }
}
