//! Embedding memoization cache.
//!
//! Content-addressed store keyed by a blake3 hash of `(message, category,
//! file)`. Only successful, non-null provider results are cached, so a failed
//! attempt re-invokes the provider on the next lookup. Growth is bounded by a
//! least-recently-used eviction policy; the capacity is configurable.

use crate::error::PipelineError;
use crate::item::{ErrorCategory, WorkItem};
use crate::provider::EmbeddingProvider;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub type CacheKey = [u8; 32];

/// Compute the content-addressed cache key for an item's embedding.
pub fn cache_key(message: &str, category: &ErrorCategory, file: &str) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(message.len() as u64).to_le_bytes());
    hasher.update(message.as_bytes());
    hasher.update(category.as_str().as_bytes());
    hasher.update(&(file.len() as u64).to_le_bytes());
    hasher.update(file.as_bytes());
    *hasher.finalize().as_bytes()
}

struct CacheEntry {
    value: Vec<f32>,
    stamp: u64,
}

struct LruStore {
    entries: HashMap<CacheKey, CacheEntry>,
    // Recency queue with lazy invalidation: every access pushes a fresh
    // (stamp, key) pair and eviction skips pairs whose stamp is stale, so
    // hits never scan the queue.
    order: VecDeque<(u64, CacheKey)>,
    clock: u64,
    capacity: usize,
}

impl LruStore {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            clock: 0,
            capacity,
        }
    }

    fn get(&mut self, key: &CacheKey) -> Option<Vec<f32>> {
        self.clock += 1;
        let stamp = self.clock;
        let entry = self.entries.get_mut(key)?;
        entry.stamp = stamp;
        let value = entry.value.clone();
        self.order.push_back((stamp, *key));
        self.compact_if_bloated();
        Some(value)
    }

    fn insert(&mut self, key: CacheKey, value: Vec<f32>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one();
        }
        self.clock += 1;
        self.order.push_back((self.clock, key));
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stamp: self.clock,
            },
        );
        self.compact_if_bloated();
    }

    fn evict_one(&mut self) {
        while let Some((stamp, key)) = self.order.pop_front() {
            let live = self.entries.get(&key).map_or(false, |e| e.stamp == stamp);
            if live {
                self.entries.remove(&key);
                return;
            }
        }
    }

    // Stale pairs accumulate one per hit; prune once the queue outgrows the
    // live set by a wide margin.
    fn compact_if_bloated(&mut self) {
        if self.order.len() > self.capacity.saturating_mul(4).max(64) {
            let entries = &self.entries;
            self.order
                .retain(|(stamp, key)| entries.get(key).map_or(false, |e| e.stamp == *stamp));
        }
    }
}

/// Get-or-compute memoization for embedding calls.
///
/// The lock is never held across an await: lookups release before the
/// provider call, and the result is inserted afterward.
pub struct EmbeddingCache {
    store: Mutex<LruStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Mutex::new(LruStore::new(capacity.max(1))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Return the memoized embedding for `item`, invoking the provider on a
    /// miss. Provider failures propagate and leave the cache untouched.
    pub async fn get_or_embed(
        &self,
        item: &WorkItem,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Option<Vec<f32>>, PipelineError> {
        let key = cache_key(&item.message, &item.category, &item.file);

        if let Some(hit) = self.store.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(item_id = %item.id, "embedding cache hit");
            return Ok(Some(hit));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let embedding = provider.embed(&item.enrichment_text()).await?;
        if let Some(vector) = &embedding {
            if !vector.is_empty() {
                self.store.lock().insert(key, vector.clone());
            }
        }
        Ok(embedding)
    }
}
