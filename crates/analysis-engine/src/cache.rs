//! Completed-result cache
//!
//! Bounded by entry count (oldest inserted is evicted first) and by age.
//! Expired entries are dropped on read and on insert.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::result::{AnalysisResult, Fingerprint};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached results
    pub capacity: usize,
    /// Age after which a cached result is discarded (seconds)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl_secs: 3600,
        }
    }
}

struct Entry {
    inserted: Instant,
    result: AnalysisResult,
}

pub struct ResultCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<Fingerprint, Entry>,
    /// Insertion order, oldest first
    order: VecDeque<Fingerprint>,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            capacity: config.capacity,
            ttl: Duration::from_secs(config.ttl_secs),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.inserted) >= self.ttl
    }

    /// Clone of a live entry; an expired one is removed
    pub fn get(&mut self, key: &Fingerprint) -> Option<AnalysisResult> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => return Some(entry.result.clone()),
            Some(_) => {}
            None => return None,
        }
        debug!("Cached result for {} expired", key);
        self.remove(key);
        None
    }

    pub fn insert(&mut self, key: Fingerprint, result: AnalysisResult) {
        if self.capacity == 0 {
            return;
        }
        self.purge_expired();
        self.remove(&key);

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!("Evicting cached result for {}", oldest);
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            Entry {
                inserted: Instant::now(),
                result,
            },
        );
    }

    pub fn remove(&mut self, key: &Fingerprint) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now.duration_since(entry.inserted) < ttl);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_analysis::MovementType;
    use pose_frame::VideoHandle;

    fn key(video: &str) -> Fingerprint {
        Fingerprint::new(&VideoHandle::new(video), MovementType::Squat)
    }

    fn result(video: &str) -> AnalysisResult {
        AnalysisResult::failed(key(video), Vec::new(), 0, 0)
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let mut cache = ResultCache::new(&CacheConfig {
            capacity: 2,
            ttl_secs: 60,
        });
        cache.insert(key("a"), result("a"));
        cache.insert(key("b"), result("b"));
        cache.insert(key("c"), result("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());
    }

    #[tokio::test]
    async fn test_reinsert_refreshes_position() {
        let mut cache = ResultCache::new(&CacheConfig {
            capacity: 2,
            ttl_secs: 60,
        });
        cache.insert(key("a"), result("a"));
        cache.insert(key("b"), result("b"));
        cache.insert(key("a"), result("a"));
        cache.insert(key("c"), result("c"));

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let mut cache = ResultCache::new(&CacheConfig {
            capacity: 8,
            ttl_secs: 10,
        });
        cache.insert(key("a"), result("a"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(cache.get(&key("a")).is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_capacity_caches_nothing() {
        let mut cache = ResultCache::new(&CacheConfig {
            capacity: 0,
            ttl_secs: 10,
        });
        cache.insert(key("a"), result("a"));
        assert!(cache.get(&key("a")).is_none());
    }
}
