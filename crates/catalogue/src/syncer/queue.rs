//! §4.7 "In-memory priority queue." Ordering: ascending by `priority`, ties
//! broken by enqueue order; duplicate `id`s are dropped on re-enqueue.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub upstream_id: String,
    pub priority: i32,
    pub retries: u8,
    seq: u64,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

#[derive(Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    present: HashSet<i64>,
    next_seq: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and drops the entry) if `id` is already queued.
    pub fn enqueue(&mut self, id: i64, upstream_id: String, priority: i32) -> bool {
        if self.present.contains(&id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.present.insert(id);
        self.heap.push(Reverse(QueueEntry { id, upstream_id, priority, retries: 0, seq }));
        true
    }

    /// Re-enqueues an item that failed processing, bypassing the duplicate
    /// check since the original occupant of `present` is this same item
    /// (removed by `take_batch` before processing began).
    pub fn requeue(&mut self, mut entry: QueueEntry, new_priority: i32) {
        entry.priority = new_priority.min(10);
        entry.retries += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        entry.seq = seq;
        self.present.insert(entry.id);
        self.heap.push(Reverse(entry));
    }

    /// Removes up to `n` entries, lowest priority first. Callers own the
    /// removed entries until they re-enqueue or drop them; `present` keeps
    /// them marked as "in the system" to prevent a concurrent duplicate
    /// `enqueue` during processing.
    pub fn take_batch(&mut self, n: usize) -> Vec<QueueEntry> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.heap.pop() {
                Some(Reverse(entry)) => out.push(entry),
                None => break,
            }
        }
        out
    }

    pub fn release(&mut self, id: i64) {
        self.present.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn snapshot(&self) -> Vec<(i64, i32, u8)> {
        self.heap.iter().map(|Reverse(e)| (e.id, e.priority, e.retries)).collect()
    }
}
