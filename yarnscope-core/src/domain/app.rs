//! Analytic job types
//!
//! An [`AnalyticJob`] describes one completed YARN application that is
//! scheduled for local performance analysis. Jobs are created from
//! ResourceManager application listings and re-materialized from the retry
//! backlog after a transient analysis failure.

use serde::{Deserialize, Serialize};

/// Application type of a completed cluster job, as reported by the
/// ResourceManager.
///
/// Each variant maps to a supported analyzer capability. Applications whose
/// declared type does not resolve to a variant are excluded from analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationType {
    MapReduce,
    Spark,
    Tez,
}

impl ApplicationType {
    /// Resolves a ResourceManager `applicationType` string to a supported
    /// analyzer capability. Matching is case-insensitive; unrecognized names
    /// yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MAPREDUCE" => Some(Self::MapReduce),
            "SPARK" => Some(Self::Spark),
            "TEZ" => Some(Self::Tez),
            _ => None,
        }
    }

    /// Human-readable name, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MapReduce => "MapReduce",
            Self::Spark => "Spark",
            Self::Tez => "Tez",
        }
    }
}

impl std::fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One completed cluster application queued for analysis.
///
/// The application id is globally unique per cluster generation. All
/// timestamps are millisecond epoch values as reported by the
/// ResourceManager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticJob {
    pub app_id: String,
    pub app_type: ApplicationType,
    pub user: String,
    pub name: String,
    pub queue: String,
    pub tracking_url: Option<String>,
    pub started_time: i64,
    pub finished_time: i64,
    /// Number of transient analysis failures so far.
    pub retries: u32,
}

impl AnalyticJob {
    /// Records one more transient failure against this job.
    ///
    /// Returns `true` if the job is still within its retry budget and should
    /// be re-offered to the backlog, `false` if it must be dropped.
    pub fn retry(&mut self, max_retries: u32) -> bool {
        self.retries += 1;
        self.retries <= max_retries
    }
}
