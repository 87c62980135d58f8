//! Bounded LRU cache for fully-formed answers.
//!
//! `ResponseCache` is the eviction structure: a map plus a recency queue of
//! `(key, seq)` stamps. Touching a key bumps its sequence and appends a new
//! stamp; stale stamps are skipped at eviction and pruned in batches, so
//! every operation is O(1) amortised. The mutex guards map bookkeeping only —
//! it is never held across a backend or model call.
//!
//! `SharedCache` adds process-level clearing: `clear()` swaps in a fresh
//! instance of the same capacity, so in-flight readers of the old instance
//! see a consistent cache rather than a half-wiped one.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use sha2::{Digest, Sha256};

use super::mode::Mode;
use super::ChainResult;

// ── Cache key ─────────────────────────────────────────────────────────────────

/// Deterministic digest over (effective mode, trimmed question). The mode
/// participates in the digest, so the same question under `graph_only` and
/// `hybrid` occupies two distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(question: &str, mode: Mode) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(mode.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(question.trim().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

// ── LRU cache ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ResponseCache {
    inner: Mutex<LruInner>,
}

#[derive(Debug)]
struct LruInner {
    capacity: usize,
    map: HashMap<CacheKey, Slot>,
    /// Recency stamps, oldest first. A stamp is live only while its seq
    /// matches the slot's current seq.
    order: VecDeque<(CacheKey, u64)>,
    next_seq: u64,
}

#[derive(Debug)]
struct Slot {
    value: ChainResult,
    seq: u64,
}

impl ResponseCache {
    /// `capacity` must be at least 1 (validated at config load).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                capacity: capacity.max(1),
                map: HashMap::new(),
                order: VecDeque::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit: refresh recency, return a clone of the stored value.
    pub fn get(&self, key: &CacheKey) -> Option<ChainResult> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let slot = inner.map.get_mut(key)?;
        inner.next_seq += 1;
        slot.seq = inner.next_seq;
        let value = slot.value.clone();
        let seq = slot.seq;

        inner.order.push_back((key.clone(), seq));
        inner.maybe_compact();
        Some(value)
    }

    /// Insert or update. Updating an existing key refreshes value and
    /// recency without changing occupancy; a new key at capacity evicts the
    /// single least-recently-used entry first.
    pub fn set(&self, key: CacheKey, value: ChainResult) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        inner.next_seq += 1;
        let seq = inner.next_seq;

        if let Some(slot) = inner.map.get_mut(&key) {
            slot.value = value;
            slot.seq = seq;
        } else {
            if inner.map.len() >= inner.capacity {
                inner.evict_lru();
            }
            inner.map.insert(key.clone(), Slot { value, seq });
        }

        inner.order.push_back((key, seq));
        inner.maybe_compact();
    }

    /// A poisoned lock only means another thread panicked mid-operation on
    /// plain map bookkeeping; the data is still structurally sound.
    fn lock(&self) -> MutexGuard<'_, LruInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LruInner {
    /// Pop stamps until one is live, then remove that entry.
    fn evict_lru(&mut self) {
        while let Some((key, seq)) = self.order.pop_front() {
            let live = self.map.get(&key).is_some_and(|s| s.seq == seq);
            if live {
                self.map.remove(&key);
                return;
            }
        }
    }

    /// Drop stale stamps once the queue outgrows the live set. Keeps the
    /// queue linear in map size, preserving amortised O(1) operations.
    fn maybe_compact(&mut self) {
        if self.order.len() > self.capacity.max(self.map.len()) * 4 {
            let map = &self.map;
            self.order
                .retain(|(key, seq)| map.get(key).is_some_and(|s| s.seq == *seq));
        }
    }
}

// ── Shared clearable handle ───────────────────────────────────────────────────

/// Shared handle over the current cache instance.
///
/// `current()` is a cheap Arc clone; `clear()` replaces the instance
/// wholesale. Readers that grabbed the old Arc finish against it untouched —
/// no call ever observes a half-cleared cache.
#[derive(Debug)]
pub struct SharedCache {
    capacity: usize,
    slot: RwLock<Arc<ResponseCache>>,
}

impl SharedCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slot: RwLock::new(Arc::new(ResponseCache::new(capacity))),
        }
    }

    pub fn current(&self) -> Arc<ResponseCache> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a fresh empty cache of the same capacity.
    pub fn clear(&self) {
        let fresh = Arc::new(ResponseCache::new(self.capacity));
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }
}
