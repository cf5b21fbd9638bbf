//! Scheduler layer for the daemon
//!
//! Drives the poll/dispatch cycle: endpoint resolution, window polling,
//! retry merging, worker-pool submission, and pacing. Per-job processing and
//! failure classification live in the worker submodule.

mod daemon;
mod worker;

pub use daemon::DispatchDaemon;
