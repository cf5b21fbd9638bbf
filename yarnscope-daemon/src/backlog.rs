//! Retry backlog
//!
//! Thread-safe queue of jobs that failed transiently and must be re-offered
//! on the next dispatch cycle. Workers are the producers, the daemon is the
//! single per-cycle consumer. Throughput on this path is low, so a
//! mutex-guarded queue is sufficient.

use std::collections::VecDeque;
use std::sync::Mutex;

use yarnscope_core::domain::AnalyticJob;

/// Unbounded multi-producer queue of jobs awaiting a retry.
#[derive(Debug, Default)]
pub struct RetryBacklog {
    queue: Mutex<VecDeque<AnalyticJob>>,
}

impl RetryBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a job for the next cycle. Never blocks on anything but the
    /// internal lock, never fails.
    pub fn offer(&self, job: AnalyticJob) {
        self.lock().push_back(job);
    }

    /// Removes and returns everything currently queued, in FIFO order.
    ///
    /// Safe to call concurrently with `offer`; a job offered mid-drain lands
    /// in either this drain or the next one, never lost.
    pub fn drain_all(&self) -> Vec<AnalyticJob> {
        self.lock().drain(..).collect()
    }

    /// Current queue depth, reported to the metrics sink.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AnalyticJob>> {
        // A poisoned lock only means a worker panicked mid-push; the queue
        // itself is still structurally sound.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}
