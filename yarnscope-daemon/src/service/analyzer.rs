//! Analysis collaborator
//!
//! The per-job heuristics engine is external to the dispatch core; it is
//! invoked as an opaque "analyze job" call and classified only by the error
//! kind it reports.

use async_trait::async_trait;
use yarnscope_core::domain::{AnalysisError, AnalysisResult, AnalyticJob};

/// Service trait for analyzing one completed application.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyzes a completed job.
    ///
    /// Every error kind is treated as transient by the worker pool: the job
    /// is retried up to its budget and then dropped.
    async fn analyze(&self, job: &AnalyticJob) -> Result<AnalysisResult, AnalysisError>;
}

/// Minimal built-in analyzer deriving wall-clock delay from the job's own
/// timestamps. Deployments wire a real heuristics engine in its place.
pub struct ElapsedTimeAnalyzer;

#[async_trait]
impl Analyzer for ElapsedTimeAnalyzer {
    async fn analyze(&self, job: &AnalyticJob) -> Result<AnalysisResult, AnalysisError> {
        Ok(AnalysisResult {
            app_id: job.app_id.clone(),
            resource_used: 0,
            resource_wasted: 0,
            total_delay: job.finished_time - job.started_time,
        })
    }
}
