use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pt_core::Confidence;
use tokio::sync::Notify;

use crate::fingerprint::Fingerprint;
use crate::optimiser::LatencyOptimiser;

const SHARD_COUNT: usize = 16;
const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_MAX_SIZE: usize = 10_000;
const MAX_APPROXIMATION_LEVEL: u32 = 4;

struct Entry<V> {
    value: V,
    confidence: Confidence,
    level: u32,
    inserted_at: Instant,
}

#[derive(Default)]
struct Shard<V> {
    entries: HashMap<Fingerprint, Entry<V>>,
    lru: VecDeque<Fingerprint>,
}

impl<V> Shard<V> {
    fn touch(&mut self, fp: Fingerprint) {
        self.lru.retain(|f| *f != fp);
        self.lru.push_back(fp);
    }

    fn evict_if_over(&mut self, cap: usize) {
        while self.entries.len() > cap {
            if let Some(victim) = self.lru.pop_front() {
                self.entries.remove(&victim);
            } else {
                break;
            }
        }
    }
}

/// Outcome of a [`QueryCache::query`] call.
#[derive(Debug, Clone)]
pub struct QueryOutcome<V> {
    pub value: V,
    pub confidence: Confidence,
    pub cached: bool,
    pub approximated: bool,
    pub computation_ms: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Memoises expensive derivations (equity, ranges, GTO hints) keyed by a
/// deterministic [`Fingerprint`] (C7). Sharded by fingerprint so readers and
/// writers on different keys never contend.
pub struct QueryCache<V: Clone + Send + Sync + 'static> {
    shards: Vec<Mutex<Shard<V>>>,
    in_flight: Mutex<HashMap<Fingerprint, Arc<Notify>>>,
    ttl: Duration,
    max_size: usize,
    optimiser: LatencyOptimiser,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS), DEFAULT_MAX_SIZE, Duration::from_millis(200))
    }
}

impl<V: Clone + Send + Sync + 'static> QueryCache<V> {
    pub fn new(ttl: Duration, max_size: usize, latency_target: Duration) -> Self {
        let mut shards = Vec::with_capacity(SHARD_COUNT);
        for _ in 0..SHARD_COUNT {
            shards.push(Mutex::new(Shard::default()));
        }
        Self {
            shards,
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            max_size,
            optimiser: LatencyOptimiser::new(latency_target),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn shard_for(&self, fp: Fingerprint) -> &Mutex<Shard<V>> {
        let idx = (fp_bucket(fp)) % self.shards.len();
        &self.shards[idx]
    }

    fn shard_cap(&self) -> usize {
        (self.max_size / self.shards.len()).max(1)
    }

    fn read_if_fresh(&self, fp: Fingerprint, min_level: u32) -> Option<(V, Confidence, u32)> {
        let mut shard = self.shard_for(fp).lock().expect("cache shard lock poisoned");
        let expired = shard.entries.get(&fp).is_some_and(|e| e.inserted_at.elapsed() > self.ttl);
        if expired {
            shard.entries.remove(&fp);
            return None;
        }
        let hit = shard.entries.get(&fp).filter(|e| e.level >= min_level).map(|e| (e.value.clone(), e.confidence, e.level));
        if hit.is_some() {
            shard.touch(fp);
        }
        hit
    }

    fn store(&self, fp: Fingerprint, value: V, confidence: Confidence, level: u32) {
        let cap = self.shard_cap();
        let mut shard = self.shard_for(fp).lock().expect("cache shard lock poisoned");
        let should_insert = shard.entries.get(&fp).is_none_or(|existing| level >= existing.level);
        if should_insert {
            shard.entries.insert(fp, Entry { value, confidence, level, inserted_at: Instant::now() });
            shard.touch(fp);
        }
        shard.evict_if_over(cap);
    }

    /// Looks up `fp`, computing on a miss via `compute`. Concurrent callers
    /// for the same fingerprint share one in-flight computation. `compute` may be invoked more than once at increasing
    /// `approximation_level` while `deadline` allows (guarantee 4); the
    /// highest level seen is what gets cached and returned.
    pub async fn query<F, Fut>(
        &self,
        fp: Fingerprint,
        query_type: &str,
        initial_level: u32,
        deadline: Duration,
        compute: F,
    ) -> QueryOutcome<V>
    where
        F: Fn(u32) -> Fut,
        Fut: std::future::Future<Output = (V, Confidence)>,
    {
        let min_level = initial_level.max(self.optimiser.default_level(query_type));

        if let Some((value, confidence, level)) = self.read_if_fresh(fp, min_level) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return QueryOutcome { value, confidence, cached: true, approximated: level > 0, computation_ms: 0 };
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let notify = {
            let mut in_flight = self.in_flight.lock().expect("cache in-flight lock poisoned");
            if let Some(existing) = in_flight.get(&fp) {
                Some(existing.clone())
            } else {
                in_flight.insert(fp, Arc::new(Notify::new()));
                None
            }
        };

        match notify {
            Some(notify) => {
                let _ = tokio::time::timeout(deadline, notify.notified()).await;
                if let Some((value, confidence, level)) = self.read_if_fresh(fp, min_level) {
                    return QueryOutcome { value, confidence, cached: true, approximated: level > 0, computation_ms: 0 };
                }
                // Owner dropped without storing a result; compute directly
                // rather than waiting forever.
                let start = Instant::now();
                let (value, confidence) = compute(min_level).await;
                self.store(fp, value.clone(), confidence, min_level);
                QueryOutcome { value, confidence, cached: false, approximated: false, computation_ms: start.elapsed().as_millis() as u64 }
            }
            None => {
                let start = Instant::now();
                let mut level = min_level;
                let (mut value, mut confidence) = compute(level).await;
                self.store(fp, value.clone(), confidence, level);
                while start.elapsed() < deadline && level < MAX_APPROXIMATION_LEVEL {
                    level += 1;
                    let (next_value, next_confidence) = compute(level).await;
                    value = next_value;
                    confidence = next_confidence;
                    self.store(fp, value.clone(), confidence, level);
                    if start.elapsed() >= deadline {
                        break;
                    }
                }
                let elapsed = start.elapsed();
                self.optimiser.record(query_type, elapsed);

                let mut in_flight = self.in_flight.lock().expect("cache in-flight lock poisoned");
                if let Some(notify) = in_flight.remove(&fp) {
                    notify.notify_waiters();
                }
                drop(in_flight);

                QueryOutcome { value, confidence, cached: false, approximated: level > min_level, computation_ms: elapsed.as_millis() as u64 }
            }
        }
    }

    /// Removes one entry, or every entry when `fp` is `None`.
    pub fn invalidate(&self, fp: Option<Fingerprint>) {
        match fp {
            Some(fp) => {
                let mut shard = self.shard_for(fp).lock().expect("cache shard lock poisoned");
                shard.entries.remove(&fp);
                shard.lru.retain(|f| *f != fp);
            }
            None => self.clear(),
        }
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            let mut shard = shard.lock().expect("cache shard lock poisoned");
            shard.entries.clear();
            shard.lru.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.shards.iter().map(|s| s.lock().expect("cache shard lock poisoned").entries.len()).sum();
        CacheStats { size, hits: self.hits.load(Ordering::Relaxed), misses: self.misses.load(Ordering::Relaxed) }
    }
}

fn fp_bucket(fp: Fingerprint) -> usize {
    // Fingerprint carries no public accessor for its raw bits outside the
    // crate; reuse its Display hex digest as a stable bucketing surrogate.
    let digest = fp.to_string();
    digest.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache: QueryCache<f64> = QueryCache::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let compute = move |_level: u32| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (42.0, Confidence::new(0.9))
            }
        };
        let fp = Fingerprint::of(&"equity-aakk");
        let first = cache.query(fp, "equity", 0, Duration::from_millis(50), compute.clone()).await;
        assert!(!first.cached);
        let second = cache.query(fp, "equity", 0, Duration::from_millis(50), compute).await;
        assert!(second.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let cache: QueryCache<f64> = QueryCache::default();
        let fp = Fingerprint::of(&"equity-aakk");
        let compute = |_level: u32| async { (1.0, Confidence::new(0.9)) };
        cache.query(fp, "equity", 0, Duration::from_millis(50), compute).await;
        cache.invalidate(Some(fp));
        let outcome = cache.query(fp, "equity", 0, Duration::from_millis(50), compute).await;
        assert!(!outcome.cached);
    }

    #[tokio::test]
    async fn lru_evicts_when_over_capacity() {
        let cache: QueryCache<f64> = QueryCache::new(Duration::from_secs(300), 16, Duration::from_millis(200));
        for i in 0..64u32 {
            let fp = Fingerprint::of(&i);
            cache.query(fp, "equity", 0, Duration::from_millis(50), move |_| async move { (i as f64, Confidence::new(0.9)) }).await;
        }
        assert!(cache.stats().size <= 16);
    }
}
