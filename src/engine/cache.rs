//! Bounded key/value store with least-recently-used eviction and optional
//! per-entry expiry.
//!
//! Recency is tracked with a monotonically increasing tick per touch; the
//! ordered `recency` map turns "find the least recently used key" into a
//! `pop_first`. Expired entries are dropped lazily on access and purged in
//! bulk before any capacity eviction, so an expired entry never pushes a live
//! one out.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::trace;

pub const DEFAULT_CACHE_MAX: usize = 2000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Source of "now" for expiry decisions.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Capacity; values below one are treated as one.
    pub max: usize,
    /// Entry lifetime; zero means entries never expire.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_CACHE_MAX,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    tick: u64,
}

#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    config: CacheConfig,
    entries: HashMap<K, CacheEntry<V>>,
    recency: BTreeMap<u64, K>,
    next_tick: u64,
    stats: CacheStats,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        let config = CacheConfig {
            max: config.max.max(1),
            ttl: config.ttl,
        };
        Self {
            config,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            stats: CacheStats::default(),
            clock,
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        if self.expire_if_stale(key, now) {
            self.stats.misses += 1;
            return None;
        }

        if !self.entries.contains_key(key) {
            self.stats.misses += 1;
            return None;
        }

        let tick = self.bump_tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key.clone());
        self.stats.hits += 1;
        Some(&entry.value)
    }

    pub fn has(&mut self, key: &K) -> bool {
        let now = self.clock.now();
        !self.expire_if_stale(key, now) && self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: K, value: V) {
        let now = self.clock.now();
        let expires_at = if self.config.ttl.is_zero() {
            None
        } else {
            Some(now + self.config.ttl)
        };
        let tick = self.bump_tick();

        if let Some(previous) = self.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at,
                tick,
            },
        ) {
            self.recency.remove(&previous.tick);
        }
        self.recency.insert(tick, key);

        if self.entries.len() > self.config.max {
            self.purge_expired(now);
        }
        while self.entries.len() > self.config.max {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
            trace!(size = self.entries.len(), "evicted least recently used cache entry");
        }
    }

    pub fn delete(&mut self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.recency.remove(&entry.tick);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn bump_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn is_stale(expires_at: Option<Instant>, now: Instant) -> bool {
        expires_at.is_some_and(|deadline| now >= deadline)
    }

    fn expire_if_stale(&mut self, key: &K, now: Instant) -> bool {
        let stale = self
            .entries
            .get(key)
            .is_some_and(|entry| Self::is_stale(entry.expires_at, now));
        if stale {
            self.delete(key);
            self.stats.expirations += 1;
        }
        stale
    }

    fn purge_expired(&mut self, now: Instant) {
        let stale = self
            .entries
            .iter()
            .filter(|(_, entry)| Self::is_stale(entry.expires_at, now))
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();
        for key in stale {
            self.delete(&key);
            self.stats.expirations += 1;
        }
    }
}
