//! Personal target evaluation
//!
//! Measures the current trend window against caller-supplied targets. The
//! targets are explicit configuration handed in per call - the engine never
//! reads them from ambient storage.

use chrono::{DateTime, Duration, Utc};

use crate::normalizer::{native_scale, normalize_score};
use crate::trend::{MeanAccumulator, TrendWindows};
use crate::types::{ActivityRecord, PersonalTargets, TargetProgress, TargetReading};

/// Evaluate configured targets against the current trend window.
///
/// Minute and session targets are prorated by the window length: a 7-day
/// window is one target week, a 14-day window two. Returns `None` when no
/// target axis is configured.
pub fn evaluate_targets(
    records: &[ActivityRecord],
    targets: &PersonalTargets,
    windows: TrendWindows,
    reference: DateTime<Utc>,
) -> Option<TargetProgress> {
    if !targets.is_configured() {
        return None;
    }

    let window_days = windows.current_days.max(0);
    let window_start = reference - Duration::days(window_days);
    let weeks = (window_days as f64 / 7.0).max(1.0 / 7.0);

    let mut score = MeanAccumulator::default();
    let mut minutes: u64 = 0;
    let mut sessions: u64 = 0;

    for record in records {
        if record.timestamp <= window_start || record.timestamp > reference {
            continue;
        }
        score.push(normalize_score(record));
        minutes += u64::from(record.duration_minutes);
        if native_scale(&record.kind).is_some() {
            sessions += 1;
        }
    }

    let mut progress = TargetProgress::default();

    if let Some(target) = targets.overall_score {
        progress.overall_score = Some(reading(target, score.mean()));
    }
    if let Some(target) = targets.weekly_minutes {
        progress.weekly_minutes = Some(reading(f64::from(target), minutes as f64 / weeks));
    }
    if let Some(target) = targets.sessions_per_week {
        progress.sessions_per_week = Some(reading(f64::from(target), sessions as f64 / weeks));
    }

    Some(progress)
}

fn reading(target: f64, actual: f64) -> TargetReading {
    let attainment_pct = if target > 0.0 {
        (actual / target * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    };

    TargetReading {
        target,
        actual,
        attainment_pct,
        met: actual >= target,
    }
}
