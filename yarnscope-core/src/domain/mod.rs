//! Domain types

mod analysis;
mod app;
mod window;

pub use analysis::{AnalysisError, AnalysisResult};
pub use app::{AnalyticJob, ApplicationType};
pub use window::PollWindow;
