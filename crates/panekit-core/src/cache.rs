#![forbid(unsafe_code)]

//! Two-pool panel cache: an unbounded Opened pool and a capacity-bounded
//! Preload pool with LRU eviction.
//!
//! Both pools live in one key-indexed map; each entry carries a pool tag,
//! so the Preload→Opened migration on activation is an O(1) re-tag of the
//! same entry, never a copy. Recency is a logical `u64` access clock
//! rather than wall time: deterministic under test and immune to clock
//! steps.
//!
//! # Invariants
//!
//! 1. Preload occupancy never exceeds the configured capacity.
//! 2. Inserting beyond capacity evicts exactly one least-recently-accessed
//!    *evictable* (non-`Persistent`) preload entry, or is rejected when
//!    none is evictable.
//! 3. `clear_preloaded`/`clear_all_preloaded` never touch Opened entries:
//!    preload caches are disposable, opened ones are lifecycle-governed.
//!
//! # Failure Modes
//!
//! - Factory failure in [`PanelCache::get_or_create`] leaves both pools
//!   untouched.
//! - Capacity zero rejects every preload insertion.

use ahash::AHashMap;

use crate::lifecycle::PanelRef;
use crate::types::{CacheMode, PanelKey};

/// Default bound on the preload pool.
pub const DEFAULT_PRELOAD_CAPACITY: usize = 10;

/// Which pool an entry currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolKind {
    Opened,
    Preload,
}

struct CacheEntry {
    panel: PanelRef,
    last_access: u64,
    pool: PoolKind,
}

/// Result of a preload insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// Inserted with room to spare.
    Inserted,
    /// Inserted after evicting the named least-recently-accessed entry.
    InsertedEvicting(PanelKey),
    /// The key was already preloaded; its instance was replaced.
    Replaced,
    /// The key is already in the Opened pool; preloading is pointless.
    AlreadyOpened,
    /// At capacity with no evictable (non-Persistent) entry.
    Rejected,
}

/// Hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that found an entry in either pool.
    pub hits: u64,
    /// `get_or_create` calls that fell through to the factory.
    pub misses: u64,
    /// Preload entries evicted by capacity pressure.
    pub evictions: u64,
    /// Preload insertions rejected for lack of an evictable entry.
    pub rejections: u64,
}

/// The two-pool panel cache.
pub struct PanelCache {
    entries: AHashMap<PanelKey, CacheEntry>,
    preload_capacity: usize,
    preload_len: usize,
    clock: u64,
    stats: CacheStats,
}

impl Default for PanelCache {
    fn default() -> Self {
        Self::new(DEFAULT_PRELOAD_CAPACITY)
    }
}

impl PanelCache {
    /// Create a cache with the given preload capacity.
    #[must_use]
    pub fn new(preload_capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            preload_capacity,
            preload_len: 0,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Fetch `key`, creating it through `make` on a miss.
    ///
    /// Opened pool first, then Preload (a hit there migrates the entry
    /// into the Opened pool in place). The factory's instance lands in
    /// the Opened pool; a factory error leaves the cache untouched.
    pub fn get_or_create<E>(
        &mut self,
        key: &PanelKey,
        make: impl FnOnce() -> Result<PanelRef, E>,
    ) -> Result<PanelRef, E> {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = tick;
            if entry.pool == PoolKind::Preload {
                entry.pool = PoolKind::Opened;
                self.preload_len -= 1;
                tracing::debug!(panel = %key, "activated preloaded panel");
            }
            self.stats.hits += 1;
            return Ok(entry.panel.clone());
        }
        let panel = make()?;
        self.stats.misses += 1;
        self.entries.insert(
            key.clone(),
            CacheEntry {
                panel: panel.clone(),
                last_access: tick,
                pool: PoolKind::Opened,
            },
        );
        Ok(panel)
    }

    /// Look up `key` in either pool, refreshing its recency. Does not
    /// migrate pools.
    pub fn get(&mut self, key: &PanelKey) -> Option<PanelRef> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_access = tick;
        self.stats.hits += 1;
        Some(entry.panel.clone())
    }

    /// Look up `key` without touching recency or stats.
    #[must_use]
    pub fn peek(&self, key: &PanelKey) -> Option<&PanelRef> {
        self.entries.get(key).map(|e| &e.panel)
    }

    /// Whether `key` is cached in either pool.
    #[must_use]
    pub fn contains(&self, key: &PanelKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All cached keys, both pools, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &PanelKey> {
        self.entries.keys()
    }

    /// All cached instances, both pools, unordered.
    pub fn instances(&self) -> impl Iterator<Item = &PanelRef> {
        self.entries.values().map(|e| &e.panel)
    }

    /// Insert a never-yet-opened instance into the preload pool.
    ///
    /// At capacity this evicts the least-recently-accessed non-Persistent
    /// preload entry first; with none evictable the insertion is rejected.
    pub fn insert_preloaded(&mut self, key: PanelKey, panel: PanelRef) -> PreloadOutcome {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            if entry.pool == PoolKind::Opened {
                return PreloadOutcome::AlreadyOpened;
            }
            entry.panel = panel;
            entry.last_access = tick;
            return PreloadOutcome::Replaced;
        }

        let mut evicted = None;
        if self.preload_len >= self.preload_capacity {
            match self.evict_lru_preload() {
                Some(victim) => evicted = Some(victim),
                None => {
                    self.stats.rejections += 1;
                    tracing::debug!(panel = %key, "preload rejected: no evictable entry");
                    return PreloadOutcome::Rejected;
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                panel,
                last_access: tick,
                pool: PoolKind::Preload,
            },
        );
        self.preload_len += 1;
        match evicted {
            Some(victim) => PreloadOutcome::InsertedEvicting(victim),
            None => PreloadOutcome::Inserted,
        }
    }

    /// Evict the least-recently-accessed evictable preload entry.
    ///
    /// `Persistent` entries are skipped. Returns the evicted key.
    fn evict_lru_preload(&mut self) -> Option<PanelKey> {
        let victim = self
            .entries
            .iter()
            .filter(|(_, e)| {
                e.pool == PoolKind::Preload && e.panel.borrow().mode() != CacheMode::Persistent
            })
            .min_by_key(|(_, e)| e.last_access)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&victim);
        self.preload_len -= 1;
        self.stats.evictions += 1;
        tracing::debug!(panel = %victim, "evicted preloaded panel (LRU)");
        Some(victim)
    }

    /// Change the preload capacity, evicting immediately when shrinking.
    ///
    /// Persistent preload entries survive even a shrink below occupancy;
    /// only capacity pressure respects their pin, so occupancy can exceed
    /// a very small capacity until they are cleared explicitly.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.preload_capacity = capacity;
        while self.preload_len > capacity {
            if self.evict_lru_preload().is_none() {
                break;
            }
        }
    }

    /// Remove one preload entry regardless of cache mode. Opened entries
    /// are untouched.
    pub fn clear_preloaded(&mut self, key: &PanelKey) -> Option<PanelRef> {
        let is_preload = self
            .entries
            .get(key)
            .is_some_and(|e| e.pool == PoolKind::Preload);
        if !is_preload {
            return None;
        }
        self.preload_len -= 1;
        self.entries.remove(key).map(|e| e.panel)
    }

    /// Drop every preload entry regardless of cache mode. Returns how
    /// many were removed.
    pub fn clear_all_preloaded(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.pool == PoolKind::Opened);
        let removed = before - self.entries.len();
        self.preload_len = 0;
        removed
    }

    /// Remove `key` from whichever pool holds it.
    pub fn remove(&mut self, key: &PanelKey) -> Option<PanelRef> {
        let entry = self.entries.remove(key)?;
        if entry.pool == PoolKind::Preload {
            self.preload_len -= 1;
        }
        Some(entry.panel)
    }

    /// Total entries across both pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether both pools are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the Opened pool.
    #[must_use]
    pub fn opened_len(&self) -> usize {
        self.entries.len() - self.preload_len
    }

    /// Entries in the Preload pool.
    #[must_use]
    pub fn preload_len(&self) -> usize {
        self.preload_len
    }

    /// Current preload capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.preload_capacity
    }

    /// Hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl std::fmt::Debug for PanelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelCache")
            .field("opened", &self.opened_len())
            .field("preloaded", &self.preload_len)
            .field("capacity", &self.preload_capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{HookSet, PanelInstance, PanelState};
    use crate::view::NullView;
    use proptest::prelude::*;

    fn key(name: &str) -> PanelKey {
        PanelKey::new(name)
    }

    fn panel(name: &str, mode: CacheMode) -> PanelRef {
        PanelInstance::new(key(name), Box::new(NullView), HookSet::new(), mode).into_ref()
    }

    #[test]
    fn miss_invokes_factory_and_lands_in_opened() {
        let mut cache = PanelCache::default();
        let got = cache
            .get_or_create(&key("shop"), || Ok::<_, ()>(panel("shop", CacheMode::Hot)))
            .unwrap();
        assert_eq!(got.borrow().key(), &key("shop"));
        assert_eq!(cache.opened_len(), 1);
        assert_eq!(cache.preload_len(), 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn hit_does_not_invoke_factory() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("shop"), || Ok::<_, ()>(panel("shop", CacheMode::Hot)))
            .unwrap();
        let got = cache
            .get_or_create(&key("shop"), || -> Result<PanelRef, ()> {
                panic!("factory must not run on a hit")
            })
            .unwrap();
        assert_eq!(got.borrow().key(), &key("shop"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn factory_error_leaves_cache_untouched() {
        let mut cache = PanelCache::default();
        let result = cache.get_or_create(&key("shop"), || Err::<PanelRef, _>("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn preload_hit_migrates_to_opened_in_place() {
        let mut cache = PanelCache::default();
        let preloaded = panel("shop", CacheMode::Hot);
        assert_eq!(
            cache.insert_preloaded(key("shop"), preloaded.clone()),
            PreloadOutcome::Inserted
        );
        assert_eq!(cache.preload_len(), 1);

        let got = cache
            .get_or_create(&key("shop"), || -> Result<PanelRef, ()> {
                panic!("preloaded instance must be reused")
            })
            .unwrap();
        // Same instance, now in the opened pool.
        assert!(std::rc::Rc::ptr_eq(&got, &preloaded));
        assert_eq!(cache.preload_len(), 0);
        assert_eq!(cache.opened_len(), 1);
    }

    #[test]
    fn plain_get_does_not_migrate() {
        let mut cache = PanelCache::default();
        cache.insert_preloaded(key("shop"), panel("shop", CacheMode::Hot));
        assert!(cache.get(&key("shop")).is_some());
        assert_eq!(cache.preload_len(), 1);
        assert_eq!(cache.opened_len(), 0);
    }

    #[test]
    fn lru_eviction_picks_least_recently_accessed() {
        let mut cache = PanelCache::new(2);
        cache.insert_preloaded(key("a"), panel("a", CacheMode::Hot));
        cache.insert_preloaded(key("b"), panel("b", CacheMode::Hot));
        // Touch "a" so "b" becomes the LRU.
        cache.get(&key("a"));
        assert_eq!(
            cache.insert_preloaded(key("c"), panel("c", CacheMode::Hot)),
            PreloadOutcome::InsertedEvicting(key("b"))
        );
        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
    }

    #[test]
    fn lru_skips_persistent_entries() {
        let mut cache = PanelCache::new(2);
        cache.insert_preloaded(key("pinned"), panel("pinned", CacheMode::Persistent));
        cache.insert_preloaded(key("b"), panel("b", CacheMode::Hot));
        // "pinned" is older, but Persistent; "b" must be the victim.
        assert_eq!(
            cache.insert_preloaded(key("c"), panel("c", CacheMode::Hot)),
            PreloadOutcome::InsertedEvicting(key("b"))
        );
        assert!(cache.contains(&key("pinned")));
    }

    #[test]
    fn insertion_rejected_when_nothing_evictable() {
        let mut cache = PanelCache::new(2);
        cache.insert_preloaded(key("a"), panel("a", CacheMode::Persistent));
        cache.insert_preloaded(key("b"), panel("b", CacheMode::Persistent));
        assert_eq!(
            cache.insert_preloaded(key("c"), panel("c", CacheMode::Hot)),
            PreloadOutcome::Rejected
        );
        assert_eq!(cache.preload_len(), 2);
        assert_eq!(cache.stats().rejections, 1);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut cache = PanelCache::new(0);
        assert_eq!(
            cache.insert_preloaded(key("a"), panel("a", CacheMode::Hot)),
            PreloadOutcome::Rejected
        );
    }

    #[test]
    fn preload_of_opened_key_is_refused() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("shop"), || Ok::<_, ()>(panel("shop", CacheMode::Hot)))
            .unwrap();
        assert_eq!(
            cache.insert_preloaded(key("shop"), panel("shop", CacheMode::Hot)),
            PreloadOutcome::AlreadyOpened
        );
    }

    #[test]
    fn preload_replaces_existing_preload() {
        let mut cache = PanelCache::default();
        cache.insert_preloaded(key("shop"), panel("shop", CacheMode::Hot));
        let replacement = panel("shop", CacheMode::Hot);
        assert_eq!(
            cache.insert_preloaded(key("shop"), replacement.clone()),
            PreloadOutcome::Replaced
        );
        assert!(std::rc::Rc::ptr_eq(cache.peek(&key("shop")).unwrap(), &replacement));
        assert_eq!(cache.preload_len(), 1);
    }

    #[test]
    fn shrinking_capacity_evicts_immediately() {
        let mut cache = PanelCache::new(4);
        for name in ["a", "b", "c", "d"] {
            cache.insert_preloaded(key(name), panel(name, CacheMode::Hot));
        }
        cache.set_capacity(2);
        assert_eq!(cache.preload_len(), 2);
        // Oldest two were evicted.
        assert!(!cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
    }

    #[test]
    fn shrinking_stops_at_persistent_entries() {
        let mut cache = PanelCache::new(3);
        cache.insert_preloaded(key("a"), panel("a", CacheMode::Persistent));
        cache.insert_preloaded(key("b"), panel("b", CacheMode::Persistent));
        cache.insert_preloaded(key("c"), panel("c", CacheMode::Hot));
        cache.set_capacity(1);
        // "c" evicted; the persistent pair stays even above capacity.
        assert_eq!(cache.preload_len(), 2);
        assert!(cache.contains(&key("a")));
        assert!(cache.contains(&key("b")));
    }

    #[test]
    fn clear_preloaded_ignores_opened_entries() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("shop"), || Ok::<_, ()>(panel("shop", CacheMode::Hot)))
            .unwrap();
        assert!(cache.clear_preloaded(&key("shop")).is_none());
        assert!(cache.contains(&key("shop")));
    }

    #[test]
    fn clear_all_preloaded_removes_even_persistent() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("open"), || Ok::<_, ()>(panel("open", CacheMode::Hot)))
            .unwrap();
        cache.insert_preloaded(key("a"), panel("a", CacheMode::Persistent));
        cache.insert_preloaded(key("b"), panel("b", CacheMode::Hot));
        assert_eq!(cache.clear_all_preloaded(), 2);
        assert_eq!(cache.preload_len(), 0);
        assert!(cache.contains(&key("open")));
    }

    #[test]
    fn remove_adjusts_the_right_pool() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("open"), || Ok::<_, ()>(panel("open", CacheMode::Hot)))
            .unwrap();
        cache.insert_preloaded(key("pre"), panel("pre", CacheMode::Hot));
        assert!(cache.remove(&key("open")).is_some());
        assert!(cache.remove(&key("pre")).is_some());
        assert!(cache.is_empty());
        assert_eq!(cache.preload_len(), 0);
    }

    #[test]
    fn keys_and_instances_span_both_pools() {
        let mut cache = PanelCache::default();
        cache
            .get_or_create(&key("open"), || Ok::<_, ()>(panel("open", CacheMode::Hot)))
            .unwrap();
        cache.insert_preloaded(key("pre"), panel("pre", CacheMode::Hot));
        let mut names: Vec<_> = cache.keys().map(|k| k.as_str().to_string()).collect();
        names.sort();
        assert_eq!(names, ["open", "pre"]);
        assert_eq!(cache.instances().count(), 2);
    }

    #[test]
    fn instances_keep_lifecycle_state() {
        let mut cache = PanelCache::default();
        let p = cache
            .get_or_create(&key("shop"), || Ok::<_, ()>(panel("shop", CacheMode::Hot)))
            .unwrap();
        p.borrow_mut().set_state(PanelState::Shown);
        let again = cache.get(&key("shop")).unwrap();
        assert_eq!(again.borrow().state(), PanelState::Shown);
    }

    #[test]
    fn debug_format() {
        let cache = PanelCache::default();
        let dbg = format!("{cache:?}");
        assert!(dbg.contains("PanelCache"));
        assert!(dbg.contains("capacity"));
    }

    proptest! {
        #[test]
        fn preload_occupancy_never_exceeds_capacity(
            capacity in 1usize..8,
            inserts in proptest::collection::vec(0u8..32, 0..64),
        ) {
            let mut cache = PanelCache::new(capacity);
            for (i, name) in inserts.iter().enumerate() {
                let k = key(&format!("p{name}"));
                let before = cache.preload_len();
                let outcome = cache.insert_preloaded(k, panel(&format!("p{name}"), CacheMode::Hot));
                prop_assert!(cache.preload_len() <= capacity);
                // Each over-capacity insertion evicts exactly one entry.
                if let PreloadOutcome::InsertedEvicting(_) = outcome {
                    prop_assert_eq!(cache.preload_len(), before);
                    prop_assert_eq!(before, capacity);
                }
                // Occasionally touch an entry to churn recency.
                if i % 3 == 0 {
                    let _ = cache.get(&key(&format!("p{}", inserts[i / 2])));
                }
            }
        }
    }
}
