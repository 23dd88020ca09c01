//! Score normalization
//!
//! This module rescales kind-specific raw scores onto a common 0-100 range
//! so that records from different producers become comparable.
//! - Quiz and test scores are stored 0-10
//! - Interview, practice, and learning scores are stored 0-100
//! - Goal milestones carry no score

use crate::types::{ActivityKind, ActivityRecord};

/// Native score scale per activity kind.
///
/// This is the single place that knows producer conventions; a new scored
/// kind needs exactly one arm here.
pub fn native_scale(kind: &ActivityKind) -> Option<f64> {
    match kind {
        ActivityKind::Quiz | ActivityKind::Test => Some(10.0),
        ActivityKind::Interview | ActivityKind::Practice => Some(100.0),
        ActivityKind::Learning => Some(100.0),
        ActivityKind::GoalStarted | ActivityKind::GoalCompleted => None,
        ActivityKind::Other(_) => None,
    }
}

/// Normalize a record's score to the common 0-100 range.
///
/// Total over every record shape: a missing or non-finite score, or a kind
/// without a native scale, yields 0. The result is always finite and in
/// [0, 100].
pub fn normalize_score(record: &ActivityRecord) -> f64 {
    let Some(scale) = native_scale(&record.kind) else {
        return 0.0;
    };
    let raw = match record.score {
        Some(value) if value.is_finite() => value,
        _ => return 0.0,
    };
    (raw / scale * 100.0).clamp(0.0, 100.0)
}
