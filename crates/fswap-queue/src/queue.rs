//! Priority intake queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info};

use fswap_models::{JobId, JobInput};

/// A job admitted for later execution.
///
/// `seq` is assigned exactly once at admission, strictly increasing
/// across all jobs regardless of priority, and only used to break
/// priority ties.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: JobId,
    pub priority: u8,
    pub seq: u64,
    pub input: JobInput,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    /// Inverted so the max-heap yields the lowest (priority, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner {
    heap: BinaryHeap<QueuedJob>,
    next_seq: u64,
}

/// Priority-ordered job intake.
///
/// Any number of admission paths may enqueue concurrently; a single
/// worker dequeues. Sequence assignment and heap insertion happen under
/// one lock, so admission is an atomic step.
pub struct JobQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means an enqueuer panicked; the heap is
        // still consistent because each operation is a single push/pop.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a job, assigning its sequence number. Returns the sequence.
    pub fn enqueue(&self, id: JobId, priority: u8, input: JobInput) -> u64 {
        let seq = {
            let mut inner = self.lock();
            inner.next_seq += 1;
            let seq = inner.next_seq;
            inner.heap.push(QueuedJob {
                id: id.clone(),
                priority,
                seq,
                input,
            });
            seq
        };
        info!(job_id = %id, priority, seq, "Enqueued job");
        self.notify.notify_one();
        seq
    }

    /// Pop the highest-priority, oldest job if one is queued.
    pub fn try_next(&self) -> Option<QueuedJob> {
        self.lock().heap.pop()
    }

    /// Bounded-wait dequeue for the worker loop.
    ///
    /// Returns `None` when the wait elapses with nothing queued, so the
    /// caller can re-check shutdown between waits.
    pub async fn next_job(&self, wait: Duration) -> Option<QueuedJob> {
        // Subscribe before checking so an enqueue between the check and
        // the wait is not lost.
        let notified = self.notify.notified();
        if let Some(job) = self.try_next() {
            return Some(job);
        }
        if tokio::time::timeout(wait, notified).await.is_err() {
            debug!("Queue wait elapsed");
            return None;
        }
        self.try_next()
    }

    /// Number of jobs currently queued.
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
