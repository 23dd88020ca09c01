//! Core types for the prep-pulse pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: canonical activity records, derived chart models, and the
//! progress snapshot output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activity kind as produced by the upstream activity log
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    Quiz,
    /// Evaluation tests; older producers log these as "eq"
    #[serde(alias = "eq")]
    Test,
    Interview,
    Practice,
    Learning,
    GoalStarted,
    GoalCompleted,
    /// For unknown producers; flagged by validation, skipped by the adapter
    #[serde(untagged)]
    Other(String),
}

impl ActivityKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::Quiz => "quiz",
            ActivityKind::Test => "test",
            ActivityKind::Interview => "interview",
            ActivityKind::Practice => "practice",
            ActivityKind::Learning => "learning",
            ActivityKind::GoalStarted => "goal-started",
            ActivityKind::GoalCompleted => "goal-completed",
            ActivityKind::Other(name) => name.as_str(),
        }
    }
}

/// Canonical skill dimension used for radar summaries
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Dimension {
    Fundamental,
    ProblemSolving,
    Communication,
    Domain,
}

/// All canonical dimensions, radar axis order
pub const DIMENSIONS: [Dimension; 4] = [
    Dimension::Fundamental,
    Dimension::ProblemSolving,
    Dimension::Communication,
    Dimension::Domain,
];

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Fundamental => "Fundamental",
            Dimension::ProblemSolving => "ProblemSolving",
            Dimension::Communication => "Communication",
            Dimension::Domain => "Domain",
        }
    }

    /// Resolve an upstream skill label to a canonical dimension.
    ///
    /// Producers disagree on naming (`FUND` vs `fundamentals` vs
    /// `fundamental`); everything listed here is a display alias. Unknown
    /// labels resolve to `None` and are dropped by the adapter.
    pub fn from_label(label: &str) -> Option<Self> {
        let folded = label.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match folded.as_str() {
            "fund" | "fundamental" | "fundamentals" => Some(Dimension::Fundamental),
            "prob" | "problemsolving" | "problem" => Some(Dimension::ProblemSolving),
            "comm" | "communication" => Some(Dimension::Communication),
            "domain" | "domainknowledge" => Some(Dimension::Domain),
            _ => None,
        }
    }
}

/// Canonical activity record - the unit of input to every aggregation.
///
/// Produced by the schema adapter; all fields are already extracted to safe
/// defaults. `score` is either absent or finite, in the kind's native scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Activity kind (fixed set; the adapter never emits `Other`)
    pub kind: ActivityKind,
    /// Raw score in the kind's native scale, if the producer reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Minutes spent on the activity
    pub duration_minutes: u32,
    /// When the activity occurred (UTC)
    pub timestamp: DateTime<Utc>,
    /// Per-dimension sub-scores, canonical keys only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skill_scores: BTreeMap<Dimension, f64>,
}

/// Time-grouping granularity for period bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

/// Bucket value mode - mean normalized score or raw record count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    Score,
    Count,
}

/// Current-vs-previous trend comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Mean normalized score over the current window
    pub current: f64,
    /// Mean normalized score over the preceding window
    pub previous: f64,
    /// current - previous
    pub delta: f64,
}

/// One period bucket of the per-type chart series.
///
/// Every period key present in the input appears with all three type fields
/// populated; a kind with no records in the bucket reports 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBucket {
    /// Zero-padded ISO period key (YYYY-MM-DD, YYYY-MM, or YYYY)
    pub period: String,
    pub quiz: f64,
    pub test: f64,
    pub interview: f64,
}

/// Per-dimension radar chart values, 0-100 each
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarSummary {
    pub fundamental: f64,
    pub problem_solving: f64,
    pub communication: f64,
    pub domain: f64,
}

impl RadarSummary {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Fundamental => self.fundamental,
            Dimension::ProblemSolving => self.problem_solving,
            Dimension::Communication => self.communication,
            Dimension::Domain => self.domain,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Fundamental => self.fundamental = value,
            Dimension::ProblemSolving => self.problem_solving = value,
            Dimension::Communication => self.communication = value,
            Dimension::Domain => self.domain = value,
        }
    }
}

/// Per-bucket comparable view combining the overall score line with the
/// bucket's dimension means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Zero-padded ISO period key
    pub period: String,
    /// Cross-kind comparable score for the bucket, 0-100
    pub overall: f64,
    /// Per-dimension means within the bucket
    pub dimensions: RadarSummary,
}

/// Personal targets, supplied explicitly by the caller.
///
/// The dashboard persists these outside the engine; they are configuration,
/// never ambient state read from inside a computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalTargets {
    /// Desired mean normalized score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    /// Desired practice minutes per week
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_minutes: Option<u32>,
    /// Desired scored sessions per week
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_per_week: Option<u32>,
}

impl PersonalTargets {
    /// Check whether any target axis is configured
    pub fn is_configured(&self) -> bool {
        self.overall_score.is_some()
            || self.weekly_minutes.is_some()
            || self.sessions_per_week.is_some()
    }
}

/// Attainment of one target axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReading {
    pub target: f64,
    pub actual: f64,
    /// actual / target, clamped to 0-100
    pub attainment_pct: f64,
    pub met: bool,
}

/// Attainment report across all configured target axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<TargetReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_minutes: Option<TargetReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_per_week: Option<TargetReading>,
}

/// All chart-facing metrics for one dashboard load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub trend: TrendSummary,
    pub series: Vec<PeriodBucket>,
    pub progress: Vec<NormalizedPoint>,
    pub radar: RadarSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<TargetProgress>,
}

/// Snapshot producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Snapshot provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProvenance {
    /// Where the records came from (endpoint URL, file path, or "stdin")
    pub source: String,
    pub computed_at_utc: String,
}

/// Snapshot quality metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotQuality {
    /// Records accepted by the adapter
    pub records_seen: usize,
    /// Records the adapter dropped (unknown kind, bad timestamp)
    pub records_skipped: usize,
    /// Fraction of accepted records contributing a usable score (0-1)
    pub coverage: f64,
    /// Degradation flags (no_records, missing_scores, skipped_records)
    pub flags: Vec<String>,
}

/// Complete prep.progress.v1 payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub snapshot_version: String,
    pub producer: SnapshotProducer,
    pub provenance: SnapshotProvenance,
    pub quality: SnapshotQuality,
    pub trend: TrendSummary,
    pub series: Vec<PeriodBucket>,
    pub progress: Vec<NormalizedPoint>,
    pub radar: RadarSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<TargetProgress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_aliases() {
        let kind: ActivityKind = serde_json::from_str("\"eq\"").unwrap();
        assert_eq!(kind, ActivityKind::Test);

        let kind: ActivityKind = serde_json::from_str("\"goal-started\"").unwrap();
        assert_eq!(kind, ActivityKind::GoalStarted);

        let kind: ActivityKind = serde_json::from_str("\"brainstorm\"").unwrap();
        assert_eq!(kind, ActivityKind::Other("brainstorm".to_string()));
    }

    #[test]
    fn test_dimension_labels() {
        assert_eq!(Dimension::from_label("FUND"), Some(Dimension::Fundamental));
        assert_eq!(
            Dimension::from_label("problem_solving"),
            Some(Dimension::ProblemSolving)
        );
        assert_eq!(
            Dimension::from_label("problemSolving"),
            Some(Dimension::ProblemSolving)
        );
        assert_eq!(Dimension::from_label("COMM"), Some(Dimension::Communication));
        assert_eq!(
            Dimension::from_label("domain_knowledge"),
            Some(Dimension::Domain)
        );
        assert_eq!(Dimension::from_label("vibes"), None);
    }

    #[test]
    fn test_radar_get_set() {
        let mut radar = RadarSummary::default();
        radar.set(Dimension::Communication, 64.0);
        assert_eq!(radar.get(Dimension::Communication), 64.0);
        assert_eq!(radar.get(Dimension::Domain), 0.0);
    }
}
