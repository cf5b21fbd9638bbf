//! Analysis result and failure classification

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of analyzing one completed application.
///
/// Resource metrics are in MB-seconds, delays in milliseconds, exactly as
/// produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub app_id: String,
    pub resource_used: i64,
    pub resource_wasted: i64,
    pub total_delay: i64,
}

impl AnalysisResult {
    /// Clamps negative resource and delay metrics to zero.
    ///
    /// Known analyzer underflow defects can produce negative values; the
    /// persisted record must never carry them.
    pub fn clamp_negative_metrics(&mut self) {
        if self.resource_used < 0 {
            self.resource_used = 0;
        }
        if self.resource_wasted < 0 {
            self.resource_wasted = 0;
        }
        if self.total_delay < 0 {
            self.total_delay = 0;
        }
    }
}

/// Failure kinds reported by the analysis collaborator.
///
/// All kinds are treated as transient by the dispatch layer: the job is
/// retried up to its budget, then dropped. Classification is by this explicit
/// kind, never by inspecting error text.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Upstream returned data the analyzer could not interpret.
    #[error("invalid response from job history source: {0}")]
    InvalidResponse(String),

    /// Job history is not yet available, the history server is still
    /// collecting data for this application.
    #[error("job history not yet available: {0}")]
    HistoryUnavailable(String),

    /// Any other analysis fault. Deliberately a catch-all so unexpected
    /// analyzer faults never vanish without at least a bounded retry.
    #[error("analysis failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_metrics_are_clamped_to_zero() {
        let mut result = AnalysisResult {
            app_id: "application_1700000000000_0001".to_string(),
            resource_used: -5,
            resource_wasted: -1,
            total_delay: -100,
        };
        result.clamp_negative_metrics();
        assert_eq!(result.resource_used, 0);
        assert_eq!(result.resource_wasted, 0);
        assert_eq!(result.total_delay, 0);
    }

    #[test]
    fn test_positive_metrics_are_untouched() {
        let mut result = AnalysisResult {
            app_id: "application_1700000000000_0002".to_string(),
            resource_used: 42,
            resource_wasted: 7,
            total_delay: 0,
        };
        result.clamp_negative_metrics();
        assert_eq!(result.resource_used, 42);
        assert_eq!(result.resource_wasted, 7);
        assert_eq!(result.total_delay, 0);
    }
}
