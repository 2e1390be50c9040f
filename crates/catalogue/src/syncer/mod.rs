//! The Syncer (C7): in-process priority queue plus worker, cron-seeded,
//! with retry/backoff and a manual high-priority path.

mod queue;
mod target;

pub use queue::QueueEntry;
pub use target::{SyncOutcome, SyncOutcomeStatus, SyncTarget};

use manhwa_store::Store;
use queue::PriorityQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_SYNC_BATCH_SIZE: usize = 10;
const MAX_RETRIES: u8 = 3;
const REQUEUE_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueItemStatus {
    pub id: i64,
    pub priority: i32,
    pub retries: u8,
}

#[derive(Debug, Clone)]
pub struct SyncerStatus {
    pub queue_length: usize,
    pub is_processing: bool,
    pub items: Vec<QueueItemStatus>,
}

pub struct Syncer {
    queue: Mutex<PriorityQueue>,
    processing: AtomicBool,
    batch_size: usize,
    target: OnceCell<Arc<dyn SyncTarget>>,
}

impl Syncer {
    pub fn new(batch_size: usize) -> Arc<Self> {
        Arc::new(Syncer {
            queue: Mutex::new(PriorityQueue::new()),
            processing: AtomicBool::new(false),
            batch_size,
            target: OnceCell::new(),
        })
    }

    /// Two-phase wiring: `CatalogueService` cannot exist before its own
    /// `Arc<Syncer>` does, so it is constructed first and attaches itself
    /// as the sync target immediately afterwards (§9 "explicit
    /// collaborators ... threaded into the CatalogueService").
    pub fn attach_target(&self, target: Arc<dyn SyncTarget>) {
        let _ = self.target.set(target);
    }

    pub fn enqueue(&self, id: i64, upstream_id: String, priority: i32) -> bool {
        self.queue.lock().unwrap().enqueue(id, upstream_id, priority)
    }

    /// §4.7 `QueueOutdated`.
    pub async fn queue_outdated(&self, store: &dyn Store) -> Result<usize, manhwa_store::StoreError> {
        let rows = store.find_outdated(100).await?;
        let mut enqueued = 0;
        for row in rows {
            let priority = if row.was_failed { 0 } else { 1 };
            if self.enqueue(row.id, row.upstream_id, priority) {
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }

    /// §4.7 `ProcessQueue`. Re-entrant: a call arriving while another is in
    /// progress returns immediately rather than running a second loop.
    pub async fn process_queue(self: &Arc<Self>) {
        if self.processing.swap(true, Ordering::SeqCst) {
            return;
        }

        loop {
            let batch = {
                let mut queue = self.queue.lock().unwrap();
                queue.take_batch(self.batch_size)
            };
            if batch.is_empty() {
                break;
            }

            let Some(target) = self.target.get().cloned() else {
                tracing::error!(event = "queue:error", "no sync target attached, aborting batch");
                break;
            };

            let outcomes = futures::future::join_all(batch.into_iter().map(|entry| {
                let target = target.clone();
                async move {
                    let outcome = target.sync_one(entry.id, &entry.upstream_id).await;
                    (entry, outcome)
                }
            }))
            .await;

            for (entry, outcome) in outcomes {
                let mut queue = self.queue.lock().unwrap();
                match outcome.status {
                    SyncOutcomeStatus::Success => {
                        tracing::info!(event = "sync:success", id = entry.id, "manhwa sync succeeded");
                        queue.release(entry.id);
                    }
                    SyncOutcomeStatus::Failed if entry.retries < MAX_RETRIES => {
                        tracing::warn!(
                            event = "sync:retry",
                            id = entry.id,
                            attempt = entry.retries + 1,
                            error = %outcome.message,
                            "manhwa sync failed, retrying"
                        );
                        queue.release(entry.id);
                        let new_priority = entry.priority + 1;
                        queue.requeue(entry, new_priority);
                    }
                    SyncOutcomeStatus::Failed => {
                        tracing::error!(
                            event = "sync:failed",
                            id = entry.id,
                            error = %outcome.message,
                            "manhwa sync failed permanently"
                        );
                        queue.release(entry.id);
                    }
                }
            }

            let empty = self.queue.lock().unwrap().is_empty();
            if empty {
                break;
            }
            tokio::time::sleep(REQUEUE_BACKOFF).await;
        }

        self.processing.store(false, Ordering::SeqCst);
    }

    pub fn spawn_process_queue(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            this.process_queue().await;
        });
    }

    /// §4.7 `SyncNow`.
    pub fn sync_now(self: &Arc<Self>, id: i64, upstream_id: String) {
        self.enqueue(id, upstream_id, 0);
        if !self.processing.load(Ordering::SeqCst) {
            self.spawn_process_queue();
        }
    }

    pub fn status(&self) -> SyncerStatus {
        let queue = self.queue.lock().unwrap();
        SyncerStatus {
            queue_length: queue.len(),
            is_processing: self.processing.load(Ordering::SeqCst),
            items: queue
                .snapshot()
                .into_iter()
                .map(|(id, priority, retries)| QueueItemStatus { id, priority, retries })
                .collect(),
        }
    }

    /// §4.7 cron trigger: each schedule gets its own `tokio::time::interval`
    /// loop spawned as an independent task.
    pub fn start_cron(self: &Arc<Self>, store: Arc<dyn Store>, schedule: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(schedule);
            loop {
                ticker.tick().await;
                if let Err(err) = this.queue_outdated(store.as_ref()).await {
                    tracing::error!(event = "queue:error", error = %err, "queue_outdated failed");
                }
                this.process_queue().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct CountingTarget {
        calls: Arc<AtomicU32>,
        fail_times: u8,
    }

    #[async_trait]
    impl SyncTarget for CountingTarget {
        async fn sync_one(&self, id: i64, _upstream_id: &str) -> SyncOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times as u32 {
                SyncOutcome {
                    status: SyncOutcomeStatus::Failed,
                    message: format!("attempt {n} failed for {id}"),
                    last_synced_at: None,
                }
            } else {
                SyncOutcome {
                    status: SyncOutcomeStatus::Success,
                    message: "ok".into(),
                    last_synced_at: None,
                }
            }
        }
    }

    #[tokio::test]
    async fn successful_item_leaves_the_queue() {
        let syncer = Syncer::new(10);
        let calls = Arc::new(AtomicU32::new(0));
        syncer.attach_target(Arc::new(CountingTarget { calls, fail_times: 0 }));
        syncer.enqueue(1, "u1".into(), 0);

        syncer.process_queue().await;

        assert_eq!(syncer.status().queue_length, 0);
    }

    #[tokio::test]
    async fn item_failing_four_times_is_retried_three_times_then_dropped() {
        let syncer = Syncer::new(10);
        let calls = Arc::new(AtomicU32::new(0));
        syncer.attach_target(Arc::new(CountingTarget { calls: calls.clone(), fail_times: 4 }));
        syncer.enqueue(1, "u1".into(), 0);

        syncer.process_queue().await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(syncer.status().queue_length, 0);
    }

    #[tokio::test]
    async fn process_queue_is_a_no_op_while_already_processing() {
        let syncer = Syncer::new(10);
        syncer.processing.store(true, Ordering::SeqCst);
        syncer.enqueue(1, "u1".into(), 0);

        syncer.process_queue().await;

        // The guard left it "processing" and untouched — the call returned
        // immediately without draining the queue.
        assert_eq!(syncer.status().queue_length, 1);
        syncer.processing.store(false, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn sync_now_enqueues_with_highest_priority() {
        let syncer = Syncer::new(10);
        syncer.enqueue(2, "u2".into(), 5);
        syncer.sync_now(1, "u1".into());

        let status = syncer.status();
        assert_eq!(status.items[0].id, 1);
        assert_eq!(status.items[0].priority, 0);
    }
}
