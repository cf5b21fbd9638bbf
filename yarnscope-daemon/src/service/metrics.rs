//! Metrics observer
//!
//! Single narrow interface through which the daemon and worker pool report
//! counters and gauges. All calls are fire-and-forget: they never block and
//! never fail the caller.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Observer for the dispatch core's counters and gauges.
pub trait MetricsSink: Send + Sync {
    /// Depth of the retry backlog.
    fn set_retry_queue_size(&self, size: usize);

    /// Number of dispatched jobs not yet picked up by a worker.
    fn set_submission_queue_size(&self, size: usize);

    /// One job reached a terminal outcome (persisted or dropped).
    fn mark_processed_job(&self);

    /// One job was dropped after exhausting its retry budget.
    fn mark_skipped_job(&self);

    /// Wall-clock duration of one job's analysis, in milliseconds.
    fn set_job_processing_time(&self, millis: u64);
}

/// Default [`MetricsSink`] backed by atomics; the dashboard layer reads the
/// values out-of-band.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    retry_queue_size: AtomicUsize,
    submission_queue_size: AtomicUsize,
    processed_jobs: AtomicU64,
    skipped_jobs: AtomicU64,
    last_processing_time_ms: AtomicU64,
}

#[allow(dead_code)]
impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_queue_size(&self) -> usize {
        self.retry_queue_size.load(Ordering::Relaxed)
    }

    pub fn submission_queue_size(&self) -> usize {
        self.submission_queue_size.load(Ordering::Relaxed)
    }

    pub fn processed_jobs(&self) -> u64 {
        self.processed_jobs.load(Ordering::Relaxed)
    }

    pub fn skipped_jobs(&self) -> u64 {
        self.skipped_jobs.load(Ordering::Relaxed)
    }

    pub fn last_processing_time_ms(&self) -> u64 {
        self.last_processing_time_ms.load(Ordering::Relaxed)
    }
}

impl MetricsSink for AtomicMetrics {
    fn set_retry_queue_size(&self, size: usize) {
        self.retry_queue_size.store(size, Ordering::Relaxed);
    }

    fn set_submission_queue_size(&self, size: usize) {
        self.submission_queue_size.store(size, Ordering::Relaxed);
    }

    fn mark_processed_job(&self) {
        self.processed_jobs.fetch_add(1, Ordering::Relaxed);
    }

    fn mark_skipped_job(&self) {
        self.skipped_jobs.fetch_add(1, Ordering::Relaxed);
    }

    fn set_job_processing_time(&self, millis: u64) {
        self.last_processing_time_ms.store(millis, Ordering::Relaxed);
    }
}
