//! Per-job worker
//!
//! Runs the external analysis call for one job, persists the result, and
//! classifies failures. Every reported failure kind is transient: the job is
//! re-offered to the retry backlog until its budget is exhausted, then
//! dropped with a skip counter. Cancellation arrives as task abort and is
//! never retried.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use tokio::time::Instant;
use tracing::{error, info, warn};
use yarnscope_core::domain::{AnalysisError, AnalyticJob};

use crate::backlog::RetryBacklog;
use crate::service::{Analyzer, MetricsSink, ResultStore};

/// Collaborators shared by every worker task.
pub(crate) struct WorkerContext {
    pub analyzer: Arc<dyn Analyzer>,
    pub store: Arc<dyn ResultStore>,
    pub metrics: Arc<dyn MetricsSink>,
    pub backlog: Arc<RetryBacklog>,
    pub max_retries: u32,
    /// Jobs dispatched but not yet picked up by a worker. Written by the
    /// daemon (increment on dispatch) and workers (decrement on pickup).
    pub pending: AtomicUsize,
}

/// Processes one job to a terminal or retryable outcome.
pub(crate) async fn process_job(mut job: AnalyticJob, ctx: &WorkerContext) {
    let analysis_name = format!("{} {}", job.app_type, job.app_id);
    info!("Analyzing {}", analysis_name);
    let started = Instant::now();

    match analyze_and_persist(&job, ctx).await {
        Ok(()) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!("Analysis of {} took {}ms", analysis_name, elapsed_ms);
            ctx.metrics.set_job_processing_time(elapsed_ms);
            ctx.metrics.mark_processed_job();
        }
        Err(err) => {
            warn!("Analysis of {} failed: {}", analysis_name, err);
            if job.retry(ctx.max_retries) {
                error!("Adding job [{}] to the retry backlog", job.app_id);
                ctx.backlog.offer(job);
                ctx.metrics.set_retry_queue_size(ctx.backlog.len());
            } else {
                error!(
                    "Dropping job [{}]: reached the maximum of {} retries",
                    job.app_id, ctx.max_retries
                );
                ctx.metrics.mark_skipped_job();
                // A drop is a terminal outcome and counts as processed.
                ctx.metrics.set_job_processing_time(started.elapsed().as_millis() as u64);
                ctx.metrics.mark_processed_job();
            }
        }
    }
}

/// Analyze, clamp underflowed metrics, persist. A save failure is classified
/// like any other unexpected analyzer fault.
async fn analyze_and_persist(job: &AnalyticJob, ctx: &WorkerContext) -> Result<(), AnalysisError> {
    let mut result = ctx.analyzer.analyze(job).await?;
    result.clamp_negative_metrics();
    ctx.store
        .save(&result)
        .await
        .map_err(|e| AnalysisError::Other(e.to_string()))?;
    Ok(())
}
