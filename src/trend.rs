//! Trend aggregation
//!
//! Compares the mean normalized score of a recent window against the window
//! immediately before it. A straight mean difference - no smoothing, no
//! outlier rejection.

use chrono::{DateTime, Duration, Utc};

use crate::normalizer::normalize_score;
use crate::types::{ActivityRecord, TrendSummary};

/// Default window length in days for both sides of the comparison
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Window sizes for the current/previous comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindows {
    /// Days covered by the current window, ending at the reference instant
    pub current_days: i64,
    /// Days covered by the window immediately before the current one
    pub previous_days: i64,
}

impl Default for TrendWindows {
    fn default() -> Self {
        Self {
            current_days: DEFAULT_WINDOW_DAYS,
            previous_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Aggregate records into a current/previous trend comparison.
///
/// The current window is `(reference - current_days, reference]`; the
/// previous window covers the `previous_days` immediately before it. The
/// windows are disjoint by construction and records outside both are
/// ignored. Empty windows report 0, never NaN.
pub fn aggregate_overall(
    records: &[ActivityRecord],
    windows: TrendWindows,
    reference: DateTime<Utc>,
) -> TrendSummary {
    let current_start = reference - Duration::days(windows.current_days.max(0));
    let previous_start = current_start - Duration::days(windows.previous_days.max(0));

    let mut current = MeanAccumulator::default();
    let mut previous = MeanAccumulator::default();

    for record in records {
        if record.timestamp > current_start && record.timestamp <= reference {
            current.push(normalize_score(record));
        } else if record.timestamp > previous_start && record.timestamp <= current_start {
            previous.push(normalize_score(record));
        }
    }

    let current = current.mean();
    let previous = previous.mean();

    TrendSummary {
        current,
        previous,
        delta: current - previous,
    }
}

/// Length-guarded running mean
#[derive(Debug, Default)]
pub(crate) struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the pushed values, 0 when nothing was pushed
    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}
