//! Bounded Expiring Cache Module
//!
//! Thread-safe handle around a [`CacheStore`] that adds read-through
//! memoization with request coalescing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Latest outcome of an in-flight computation; `None` until it finishes.
type Outcome<V, E> = Option<std::result::Result<V, E>>;

/// A producer currently running for some key.
struct InFlight<V, E> {
    id: u64,
    outcome: watch::Receiver<Outcome<V, E>>,
}

struct Inner<V, E> {
    store: CacheStore<V>,
    in_flight: HashMap<String, InFlight<V, E>>,
    next_flight_id: u64,
}

/// What a `compute_once` caller does after inspecting the cache.
enum Plan<V, E> {
    Hit(V),
    Join(watch::Receiver<Outcome<V, E>>),
    Lead {
        id: u64,
        outcome: watch::Receiver<Outcome<V, E>>,
        publish: watch::Sender<Outcome<V, E>>,
    },
}

// == Bounded Expiring Cache ==
/// A named, capacity-bounded cache whose entries expire after a fixed TTL.
///
/// Cloning yields another handle to the same cache. All state sits behind
/// one mutex per instance that is never held across an `.await`.
///
/// `E` is the error type of the producers handed to
/// [`compute_once`](Self::compute_once). It must be `Clone` so that a single
/// failure can be delivered to every coalesced caller.
pub struct BoundedExpiringCache<V, E> {
    name: &'static str,
    inner: Arc<Mutex<Inner<V, E>>>,
}

impl<V, E> Clone for BoundedExpiringCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> BoundedExpiringCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    // == Constructors ==
    /// Creates a cache reading the system clock.
    pub fn new(name: &'static str, config: CacheConfig) -> Result<Self> {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Creates a cache driven by `clock`.
    pub fn with_clock(
        name: &'static str,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = CacheStore::new(config, clock)?;
        Ok(Self {
            name,
            inner: Arc::new(Mutex::new(Inner {
                store,
                in_flight: HashMap::new(),
                next_flight_id: 0,
            })),
        })
    }

    // == Get ==
    /// Returns a clone of the live value under `key`, promoting it to most
    /// recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().store.get(key)
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous value and
    /// restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.lock().store.set(key.into(), value);
    }

    // == Delete ==
    /// Invalidates `key`.
    ///
    /// A computation already running for the key still answers its own
    /// callers, but its result is no longer stored.
    pub fn delete(&self, key: &str) {
        let mut inner = self.lock();
        let removed = inner.store.delete(key);
        let detached = inner.in_flight.remove(key).is_some();
        if removed || detached {
            debug!(cache = self.name, key, "invalidated");
        }
    }

    // == Clear ==
    /// Invalidates every key.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.store.clear();
        inner.in_flight.clear();
        debug!(cache = self.name, "cleared");
    }

    // == Compute Once ==
    /// Returns the cached value for `key`, computing it with `producer` on a
    /// miss.
    ///
    /// Concurrent misses on the same key share one producer run. The
    /// producer runs on its own task, so dropping the returned future does
    /// not cancel it and a successful result is still cached. A failure is
    /// handed to every waiting caller and nothing is stored.
    pub async fn compute_once<F, Fut>(
        &self,
        key: impl Into<String>,
        producer: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let key = key.into();

        let outcome = match self.plan(&key) {
            Plan::Hit(value) => return Ok(value),
            Plan::Join(outcome) => {
                drop(producer);
                debug!(cache = self.name, key = %key, "joined in-flight computation");
                outcome
            }
            Plan::Lead {
                id,
                outcome,
                publish,
            } => {
                let flight = Flight {
                    name: self.name,
                    inner: Arc::clone(&self.inner),
                    key: key.clone(),
                    id,
                };
                let work = producer();
                tokio::spawn(async move {
                    let result = work.await;
                    flight.finish(&result);
                    let _ = publish.send(Some(result));
                });
                outcome
            }
        };

        wait_for_outcome(&key, outcome).await
    }

    /// Decides, under the lock, whether to serve, join or lead.
    fn plan(&self, key: &str) -> Plan<V, E> {
        let mut inner = self.lock();

        if let Some(value) = inner.store.get(key) {
            return Plan::Hit(value);
        }

        if let Some(flight) = inner.in_flight.get(key) {
            let outcome = flight.outcome.clone();
            inner.store.stats_mut().record_coalesced();
            return Plan::Join(outcome);
        }

        let id = inner.next_flight_id;
        inner.next_flight_id += 1;
        let (publish, outcome) = watch::channel(None);
        inner.in_flight.insert(
            key.to_string(),
            InFlight {
                id,
                outcome: outcome.clone(),
            },
        );
        inner.store.stats_mut().record_computation();

        Plan::Lead {
            id,
            outcome,
            publish,
        }
    }

    // == Maintenance ==
    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.lock().store.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().store.stats()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().store.capacity()
    }

    pub fn ttl(&self) -> Duration {
        self.lock().store.ttl()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn wait_for_outcome<V, E>(
    key: &str,
    mut outcome: watch::Receiver<Outcome<V, E>>,
) -> std::result::Result<V, E>
where
    V: Clone,
    E: Clone + From<CacheError>,
{
    let finished = outcome
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|slot| slot.clone());

    // The sender only disappears without publishing when the producer task
    // panicked or the runtime shut down under it.
    finished.unwrap_or_else(|| {
        Err(E::from(CacheError::ComputationAborted {
            key: key.to_string(),
        }))
    })
}

// == Flight ==
/// Registration of one producer run. Dropping it without `finish` (a panic
/// inside the producer) still releases the key.
struct Flight<V, E> {
    name: &'static str,
    inner: Arc<Mutex<Inner<V, E>>>,
    key: String,
    id: u64,
}

impl<V: Clone, E> Flight<V, E> {
    /// Stores a successful result if the registration is still current and
    /// releases the key.
    fn finish(&self, result: &std::result::Result<V, E>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.is_current(&inner) {
            debug!(cache = self.name, key = %self.key, "discarding result of invalidated computation");
            return;
        }
        inner.in_flight.remove(&self.key);

        match result {
            Ok(value) => inner.store.set(self.key.clone(), value.clone()),
            Err(_) => {
                warn!(cache = self.name, key = %self.key, "producer failed, result not cached")
            }
        }
    }

    fn is_current(&self, inner: &Inner<V, E>) -> bool {
        inner
            .in_flight
            .get(&self.key)
            .is_some_and(|flight| flight.id == self.id)
    }
}

impl<V, E> Drop for Flight<V, E> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = inner
            .in_flight
            .get(&self.key)
            .is_some_and(|flight| flight.id == self.id);
        if current {
            inner.in_flight.remove(&self.key);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::ServiceError;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type TestCache = BoundedExpiringCache<u32, ServiceError>;

    fn cache_with_clock(capacity: usize, ttl_ms: u64) -> (TestCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = TestCache::with_clock(
            "test",
            CacheConfig::new(capacity, Duration::from_millis(ttl_ms)),
            Arc::new(clock.clone()),
        )
        .unwrap();
        (cache, clock)
    }

    async fn exploding_producer() -> std::result::Result<u32, ServiceError> {
        panic!("producer blew up")
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not reached in time");
    }

    #[test]
    fn test_construction_rejects_zero_capacity() {
        let result = TestCache::new("test", CacheConfig::new(0, Duration::from_secs(1)));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_lru_eviction_under_pressure() {
        let (cache, _) = cache_with_clock(3, 60_000);

        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.set(key, i as u32);
        }

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_read_protects_from_eviction() {
        let (cache, _) = cache_with_clock(3, 60_000);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        assert_eq!(cache.get("a"), Some(1));
        cache.set("d", 4);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_ttl_expiry_with_simulated_time() {
        let (cache, clock) = cache_with_clock(10, 1000);

        cache.set("k", 7);
        clock.advance(Duration::from_millis(999));
        assert_eq!(cache.get("k"), Some(7));

        clock.advance(Duration::from_millis(2));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (cache, clock) = cache_with_clock(2, 1000);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));

        clock.advance(Duration::from_millis(1001));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let handle = cache.clone();

        handle.set("shared", 5);
        assert_eq!(cache.get("shared"), Some(5));

        cache.clear();
        assert!(handle.is_empty());
    }

    #[tokio::test]
    async fn test_compute_once_hit_skips_producer() {
        let (cache, _) = cache_with_clock(10, 60_000);
        cache.set("k", 1);

        let value = cache
            .compute_once("k", exploding_producer)
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(cache.stats().computations, 0);
    }

    #[tokio::test]
    async fn test_compute_once_stores_result() {
        let (cache, _) = cache_with_clock(10, 60_000);

        let value = cache.compute_once("k", || async { Ok(42) }).await.unwrap();

        assert_eq!(value, 42);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[tokio::test]
    async fn test_concurrent_misses_run_producer_once() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let calls = Arc::new(AtomicUsize::new(0));

        let requests = (0..16).map(|_| {
            let calls = Arc::clone(&calls);
            cache.compute_once("cold", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(99)
            })
        });
        let results = join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.into_iter().all(|r| r == Ok(99)));
        let stats = cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.coalesced, 15);
    }

    #[tokio::test]
    async fn test_coalescing_across_tasks() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    cache
                        .compute_once("cold", move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            gate.notified().await;
                            Ok(7)
                        })
                        .await
                })
            })
            .collect();

        wait_until(|| cache.stats().coalesced == 7).await;
        gate.notify_one();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_cached() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let calls = Arc::new(AtomicUsize::new(0));

        let requests = (0..4).map(|_| {
            let calls = Arc::clone(&calls);
            cache.compute_once("flaky", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(ServiceError::Repository("connection reset".to_string()))
            })
        });
        let results = join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(
                result,
                Err(ServiceError::Repository("connection reset".to_string()))
            );
        }
        assert_eq!(cache.get("flaky"), None);

        // The next call retries from scratch
        let retried = cache.compute_once("flaky", || async { Ok(3) }).await;
        assert_eq!(retried, Ok(3));
        assert_eq!(cache.stats().computations, 2);
    }

    #[tokio::test]
    async fn test_delete_then_compute_runs_producer_again() {
        let (cache, _) = cache_with_clock(10, 60_000);

        cache.set("k", 1);
        cache.delete("k");
        assert_eq!(cache.get("k"), None);

        let value = cache.compute_once("k", || async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(cache.stats().computations, 1);
    }

    #[tokio::test]
    async fn test_delete_during_computation_discards_result() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let gate = Arc::new(Notify::new());

        let pending = {
            let cache = cache.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cache
                    .compute_once("k", move || async move {
                        gate.notified().await;
                        Ok(1)
                    })
                    .await
            })
        };

        wait_until(|| cache.stats().computations == 1).await;
        cache.delete("k");
        gate.notify_one();

        // The caller still gets its answer, the cache does not keep it
        assert_eq!(pending.await.unwrap(), Ok(1));
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_abandoned_caller_still_caches_result() {
        let (cache, _) = cache_with_clock(10, 60_000);
        let gate = Arc::new(Notify::new());

        let abandoned = {
            let cache = cache.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cache
                    .compute_once("k", move || async move {
                        gate.notified().await;
                        Ok(11)
                    })
                    .await
            })
        };

        wait_until(|| cache.stats().computations == 1).await;
        abandoned.abort();
        gate.notify_one();

        wait_until(|| cache.get("k").is_some()).await;
        assert_eq!(cache.get("k"), Some(11));
    }

    #[tokio::test]
    async fn test_panicking_producer_releases_key() {
        let (cache, _) = cache_with_clock(10, 60_000);

        let result = cache.compute_once("k", exploding_producer).await;
        assert_eq!(
            result,
            Err(ServiceError::Cache(CacheError::ComputationAborted {
                key: "k".to_string()
            }))
        );

        let value = cache.compute_once("k", || async { Ok(5) }).await;
        assert_eq!(value, Ok(5));
    }

    #[test]
    fn test_compute_once_hit_outside_runtime() {
        let (cache, _) = cache_with_clock(10, 60_000);
        cache.set("k", 8);

        // A hit never spawns, so no runtime is needed to drive it
        let value = tokio_test::block_on(cache.compute_once("k", || async { Ok(0) }));
        assert_eq!(value, Ok(8));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache_with_clock(10, 1000);

        cache.set("a", 1);
        clock.advance(Duration::from_millis(600));
        cache.set("b", 2);
        clock.advance(Duration::from_millis(600));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
