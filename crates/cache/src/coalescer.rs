//! Request coalescer (C3): at-most-one in-flight producer per key.
//!
//! In-progress keys are marked in a `DashMap`, with an RAII guard to
//! deregister them on every exit path (including panics). The leader
//! broadcasts its outcome to followers via a `tokio::sync::watch` channel,
//! so that "every caller receives the same outcome" (§4.3) holds without
//! re-running the producer.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

type Slot<T, E> = Arc<watch::Sender<Option<Result<T, E>>>>;

/// Deregisters the key's in-flight slot on drop, regardless of how the
/// producer future completes. §4.3: "Deregistration must happen after the
/// outcome is observable, on every exit path."
struct CleanupGuard<'a, T, E> {
    map: &'a DashMap<String, Slot<T, E>>,
    key: String,
}

impl<T, E> Drop for CleanupGuard<'_, T, E> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// At-most-one in-flight task per key (§4.3).
pub struct Coalescer<T, E> {
    in_flight: DashMap<String, Slot<T, E>>,
    pending: AtomicUsize,
}

impl<T, E> Default for Coalescer<T, E> {
    fn default() -> Self {
        Coalescer {
            in_flight: DashMap::new(),
            pending: AtomicUsize::new(0),
        }
    }
}

impl<T, E> Coalescer<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `producer` at most once per `key` among concurrent callers; all
    /// callers for the same key receive a clone of its `Ok`/`Err` outcome.
    pub async fn coalesce<F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (slot, is_leader) = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(vacant) => {
                let (tx, _rx) = watch::channel(None);
                let slot = Arc::new(tx);
                vacant.insert(slot.clone());
                (slot, true)
            }
        };

        if is_leader {
            self.pending.fetch_add(1, Ordering::Relaxed);
            let _cleanup = CleanupGuard {
                map: &self.in_flight,
                key: key.to_string(),
            };
            let result = producer().await;
            self.pending.fetch_sub(1, Ordering::Relaxed);
            // Send after the cleanup guard is still alive so a follower
            // that subscribes concurrently still observes the value before
            // (or right as) the key is deregistered.
            let _ = slot.send(Some(result.clone()));
            result
        } else {
            let mut rx = slot.subscribe();
            loop {
                if let Some(outcome) = rx.borrow().clone() {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    // Leader dropped the sender without sending — only
                    // possible if it panicked. Fall back to running the
                    // producer ourselves rather than hanging forever.
                    return producer().await;
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn reset(&self) {
        self.in_flight.clear();
        self.pending.store(0, Ordering::Relaxed);
    }
}
