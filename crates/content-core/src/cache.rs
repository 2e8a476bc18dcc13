//! In-memory cache of the current day's content.
//!
//! Lets the UI render immediately on a warm relaunch without waiting on a
//! network round trip. This is a latency optimization only: the live
//! content subscription is the source of truth and overwrites a stale
//! cache within one round trip.

use tokio::sync::RwLock;

use crate::model::DailyContent;

/// Thread-safe holder of the most recently observed daily content.
#[derive(Debug, Default)]
pub struct ContentCache {
    entry: RwLock<Option<DailyContent>>,
}

impl ContentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry only if it is still fresh: its
    /// `scheduled_date` equals `today` and it belongs to `couple_id`.
    /// A stale entry is evicted on the spot and never returned.
    pub async fn get(&self, couple_id: &str, today: &str) -> Option<DailyContent> {
        {
            let guard = self.entry.read().await;
            match guard.as_ref() {
                Some(content)
                    if content.couple_id == couple_id && content.scheduled_date == today =>
                {
                    return Some(content.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: evict under the write lock, re-checking first because
        // another task may have replaced the entry with a fresh one.
        let mut guard = self.entry.write().await;
        if let Some(content) = guard.as_ref() {
            if content.couple_id == couple_id && content.scheduled_date == today {
                return Some(content.clone());
            }
            *guard = None;
        }
        None
    }

    /// Replace the cached entry unconditionally.
    pub async fn put(&self, content: DailyContent) {
        *self.entry.write().await = Some(content);
    }

    /// Drop the cached entry, if any.
    pub async fn clear(&self) {
        *self.entry.write().await = None;
    }
}
