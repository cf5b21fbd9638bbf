//! Service layer
//!
//! External collaborators of the dispatch core, behind narrow traits so the
//! scheduler is testable with in-process fakes: the analysis engine, the
//! result store, and the metrics observer.

mod analyzer;
mod metrics;
mod store;

// Re-export traits
pub use analyzer::Analyzer;
pub use metrics::MetricsSink;
pub use store::ResultStore;

// Re-export implementations
pub use analyzer::ElapsedTimeAnalyzer;
pub use metrics::AtomicMetrics;
pub use store::InMemoryResultStore;
