//! Incremental poll window
//!
//! Completed applications are discovered through a half-open time interval
//! `(watermark, now - lag]`. The trailing lag compensates for the delay
//! between an application finishing and its data becoming queryable on the
//! ResourceManager, so a window is never closed over data that has not been
//! published yet.

use serde::{Deserialize, Serialize};

/// Half-open polling interval `(begin, end]` in millisecond epoch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollWindow {
    /// Exclusive lower bound: the watermark of the previous successful cycle.
    pub begin: i64,
    /// Inclusive upper bound: `now - lag` at the time the window was opened.
    pub end: i64,
}

impl PollWindow {
    /// Opens the next window after `watermark`, trailing `now` by `lag_ms`.
    pub fn trailing(watermark: i64, now_ms: i64, lag_ms: i64) -> Self {
        Self {
            begin: watermark,
            end: now_ms - lag_ms,
        }
    }

    /// A window is empty when the lagged clock has not moved past the
    /// watermark. An empty window polls nothing and leaves the watermark
    /// unchanged.
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// Inclusive `finishedTimeBegin` query bound: one millisecond past the
    /// previous cycle's upper bound, so consecutive windows neither gap nor
    /// overlap.
    pub fn query_begin(&self) -> i64 {
        self.begin + 1
    }

    /// Inclusive `finishedTimeEnd` query bound.
    pub fn query_end(&self) -> i64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_subtraction() {
        // Watermark 1000, lag 300000, now 305000: upper bound lands at 5000.
        let window = PollWindow::trailing(1_000, 305_000, 300_000);
        assert_eq!(window.begin, 1_000);
        assert_eq!(window.end, 5_000);
        assert!(!window.is_empty());
        assert_eq!(window.query_begin(), 1_001);
        assert_eq!(window.query_end(), 5_000);
    }

    #[test]
    fn test_consecutive_windows_have_no_gap_and_no_overlap() {
        let first = PollWindow::trailing(0, 310_000, 300_000);
        let second = PollWindow::trailing(first.end, 370_000, 300_000);
        assert_eq!(second.query_begin(), first.query_end() + 1);
    }

    #[test]
    fn test_window_is_empty_when_lagged_clock_behind_watermark() {
        let window = PollWindow::trailing(10_000, 305_000, 300_000);
        assert_eq!(window.end, 5_000);
        assert!(window.is_empty());
    }
}
