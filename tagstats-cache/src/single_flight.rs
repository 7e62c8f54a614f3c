//! Single-flight cache with TTL-bounded reuse.
//!
//! This module implements the core coalescing logic:
//! - A fresh cached value (younger than the TTL) is served without
//!   invoking the producer at all.
//! - The first caller to miss claims the key's pending slot and becomes
//!   the leader; the producer runs exactly once per pending cycle.
//! - Callers that arrive while a computation is in flight join as
//!   waiters and receive the identical outcome, success or failure.
//!
//! The pending slot is claimed through the map's entry API, so the
//! "is pending / is fresh" check and the transition to pending happen
//! under one entry lock from any concurrent caller.
//!
//! The leader hands the producer future to a detached task, so a
//! computation runs to completion even when every caller has given up.
//! A failed computation clears the pending slot without touching the
//! stored value or its timestamp: the next caller recomputes instead of
//! replaying a stale value forever.
//!
//! Entries are never purged. The key set grows monotonically, bounded by
//! the number of distinct keys ever requested. Keys are compared exactly
//! as supplied; no normalization happens at this layer.
//!
//! There is no deadline on an in-flight computation: a producer that
//! never settles blocks all current and future waiters for its key.
//!
//! # Example
//!
//! ```ignore
//! let cache: SingleFlightCache<String, Vec<Row>, StoreError> =
//!     SingleFlightCache::new(Duration::from_millis(20_000));
//!
//! let rows = cache
//!     .get(hashtag.to_string(), move |tag| async move { store.query(&tag).await })
//!     .await?;
//! ```

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;

/// Default freshness window for cached values (20 seconds).
pub const DEFAULT_TTL: Duration = Duration::from_millis(20_000);

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Error returned by [`SingleFlightCache::get`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError<E> {
    /// The in-flight computation failed. Every caller waiting on this
    /// pending cycle receives the same failure.
    #[error("in-flight computation failed")]
    Producer(E),

    /// The in-flight computation died without settling. Only a producer
    /// panic can leave a cycle in this state.
    #[error("in-flight computation was interrupted before settling")]
    Interrupted,
}

// ============================================================================
// CACHE ENTRY
// ============================================================================

/// A successfully computed value and the instant it was stored.
struct StoredValue<V> {
    value: V,
    created_at: Instant,
}

/// Per-key cache state. `value` is only ever replaced by a successful
/// computation; `pending` is `Some` exactly while a computation is in
/// flight for the key.
struct CacheEntry<V, E> {
    value: Option<StoredValue<V>>,
    pending: Option<broadcast::Sender<Result<V, CacheError<E>>>>,
}

impl<V, E> Default for CacheEntry<V, E> {
    fn default() -> Self {
        Self {
            value: None,
            pending: None,
        }
    }
}

/// Outcome of atomically inspecting an entry.
enum Flight<V, E> {
    /// Fresh cached value; no computation needed.
    Fresh(V),
    /// Another caller owns the in-flight computation; await its outcome.
    Join(broadcast::Receiver<Result<V, CacheError<E>>>),
    /// This caller claimed the pending slot and must start the producer.
    Lead(broadcast::Receiver<Result<V, CacheError<E>>>),
}

// ============================================================================
// SINGLE-FLIGHT CACHE
// ============================================================================

/// Key-scoped, single-flight, TTL-bounded cache.
///
/// Cloning is cheap and clones share the same entries; construct one
/// instance at the composition root and pass it to whatever exposes the
/// cached operation.
pub struct SingleFlightCache<K, V, E> {
    entries: Arc<DashMap<K, CacheEntry<V, E>>>,
    ttl: Duration,
}

impl<K, V, E> Clone for SingleFlightCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, V, E> SingleFlightCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a cache whose values stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Create a cache with the default 20-second freshness window.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// The configured freshness window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of keys ever cached or in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the value for `key`, invoking `producer` at most once across
    /// all concurrent callers.
    ///
    /// A fresh cached value is returned immediately. Otherwise the first
    /// caller starts `producer(key)` on a detached task and every caller
    /// for the key, leader included, resolves with that one outcome.
    pub async fn get<F, Fut>(&self, key: K, producer: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        match self.claim(&key) {
            Flight::Fresh(value) => Ok(value),
            Flight::Join(mut rx) => Self::await_outcome(&mut rx).await,
            Flight::Lead(mut rx) => {
                let entries = Arc::clone(&self.entries);
                let fut = producer(key.clone());
                tokio::spawn(async move {
                    let outcome = fut.await;
                    Self::settle(&entries, &key, outcome);
                });
                Self::await_outcome(&mut rx).await
            }
        }
    }

    /// Atomically decide whether this caller hits, joins, or leads.
    fn claim(&self, key: &K) -> Flight<V, E> {
        let mut entry = self.entries.entry(key.clone()).or_default();

        if let Some(tx) = entry.pending.as_ref() {
            tracing::trace!("joining in-flight computation");
            return Flight::Join(tx.subscribe());
        }

        if let Some(stored) = entry.value.as_ref() {
            if stored.created_at.elapsed() < self.ttl {
                tracing::trace!("cache hit");
                return Flight::Fresh(stored.value.clone());
            }
        }

        tracing::trace!("cache miss, claiming pending slot");
        let (tx, rx) = broadcast::channel(1);
        entry.pending = Some(tx);
        Flight::Lead(rx)
    }

    /// Store a successful outcome, clear the pending slot, and fan the
    /// outcome out to every waiter of this pending cycle.
    ///
    /// Taking the sender under the entry lock orders it against
    /// [`Self::claim`]: a caller that saw the slot pending subscribed
    /// before the send below; a caller that did not will observe the
    /// stored value (or a stale timestamp) instead.
    fn settle(entries: &DashMap<K, CacheEntry<V, E>>, key: &K, outcome: Result<V, E>) {
        let outcome = outcome.map_err(CacheError::Producer);

        let tx = {
            let Some(mut entry) = entries.get_mut(key) else {
                return;
            };
            if let Ok(value) = outcome.as_ref() {
                entry.value = Some(StoredValue {
                    value: value.clone(),
                    created_at: Instant::now(),
                });
            }
            entry.pending.take()
        };

        if let Some(tx) = tx {
            let _ = tx.send(outcome);
        }
    }

    async fn await_outcome(
        rx: &mut broadcast::Receiver<Result<V, CacheError<E>>>,
    ) -> Result<V, CacheError<E>> {
        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(CacheError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type TestCache = SingleFlightCache<String, i32, String>;

    #[tokio::test]
    async fn coalesces_concurrent_calls_into_one_producer_run() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get("alpha".to_string(), move |_key| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_secs(60));

        let slow = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .get("slow".to_string(), |_key| async move {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok::<_, String>(1)
                    })
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = Instant::now();
        let fast = cache
            .get("fast".to_string(), |_key| async move { Ok::<_, String>(2) })
            .await;
        assert_eq!(fast, Ok(2));
        assert!(started.elapsed() < Duration::from_millis(250));

        assert_eq!(slow.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn ttl_window_governs_recomputation() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_millis(80));
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in [7, 7] {
            let calls = Arc::clone(&calls);
            let value = cache
                .get("alpha".to_string(), move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                })
                .await;
            assert_eq!(value, Ok(expected));
        }
        // Second call was a hit inside the window.
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;

        let recomputed = cache
            .get("alpha".to_string(), {
                let calls = Arc::clone(&calls);
                move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(8)
                }
            })
            .await;
        assert_eq!(recomputed, Ok(8));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_fans_out_to_every_waiter() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get("alpha".to_string(), move |_key| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err::<i32, _>("boom".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Err(CacheError::Producer("boom".to_string()))
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_does_not_advance_the_timestamp() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_millis(50));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get("alpha".to_string(), {
                let calls = Arc::clone(&calls);
                move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(1)
                }
            })
            .await;
        assert_eq!(first, Ok(1));

        tokio::time::sleep(Duration::from_millis(70)).await;

        let refresh = cache
            .get("alpha".to_string(), {
                let calls = Arc::clone(&calls);
                move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>("boom".to_string())
                }
            })
            .await;
        assert_eq!(refresh, Err(CacheError::Producer("boom".to_string())));

        // The failure neither stored a value nor refreshed the stale
        // timestamp, so the next call recomputes immediately.
        let after = cache
            .get("alpha".to_string(), {
                let calls = Arc::clone(&calls);
                move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(3)
                }
            })
            .await;
        assert_eq!(after, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn producer_runs_to_completion_when_caller_gives_up() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn({
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                cache
                    .get("alpha".to_string(), move |_key| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(9)
                    })
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The computation settled despite the abort; a later call is a
        // hit and its own producer never runs.
        let value = cache
            .get("alpha".to_string(), |_key| async move {
                Ok::<_, String>(0)
            })
            .await;
        assert_eq!(value, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keys_are_case_sensitive() {
        let cache: TestCache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for (key, expected) in [("Alpha", 1), ("alpha", 2)] {
            let calls = Arc::clone(&calls);
            let value = cache
                .get(key.to_string(), move |_key| async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, String>(n as i32)
                })
                .await;
            assert_eq!(value, Ok(expected));
        }
        assert_eq!(cache.len(), 2);
    }
}
