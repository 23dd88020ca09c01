//! Pipeline orchestration
//!
//! This module provides the public API for prep-pulse. It orchestrates the
//! full pipeline from raw activity JSON to the progress snapshot.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::buckets::{bucket_by_period, progress_series};
use crate::encoder::{SnapshotEncoder, SourceStats};
use crate::error::MetricsError;
use crate::normalizer::native_scale;
use crate::radar::radar_dimensions;
use crate::schema::{ActivityAdapter, AdapterOutcome};
use crate::targets::evaluate_targets;
use crate::trend::{aggregate_overall, TrendWindows};
use crate::types::{
    ActivityRecord, BucketMode, Granularity, PersonalTargets, ProgressMetrics, ProgressSnapshot,
};

/// Caller-supplied view configuration for one dashboard load.
///
/// Everything that shapes the computation arrives here - nothing is read
/// from ambient storage inside the pipeline.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Bucketing granularity for the chart series
    pub granularity: Granularity,
    /// Score or count mode for the per-type series
    pub mode: BucketMode,
    /// Window sizes for the trend comparison
    pub windows: TrendWindows,
    /// Reference instant for the trend windows; now when absent
    pub reference: Option<DateTime<Utc>>,
    /// Personal targets to evaluate, if the user configured any
    pub targets: Option<PersonalTargets>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Day,
            mode: BucketMode::Score,
            windows: TrendWindows::default(),
            reference: None,
            targets: None,
        }
    }
}

/// Convert a raw activity JSON array to a prep.progress.v1 snapshot.
///
/// # Arguments
/// * `raw_json` - JSON array of prep.activity.v1 objects
/// * `options` - view configuration for this load
///
/// # Returns
/// Pretty-printed snapshot JSON
///
/// # Example
/// ```ignore
/// let snapshot_json = activity_to_snapshot(&body, &ViewOptions::default())?;
/// ```
pub fn activity_to_snapshot(
    raw_json: &str,
    options: &ViewOptions,
) -> Result<String, MetricsError> {
    let events = ActivityAdapter::parse_array(raw_json)?;
    let outcome = ActivityAdapter::to_canonical(&events);
    ProgressEngine::new(options.clone()).snapshot_json(&outcome, "inline")
}

/// Engine holding the view configuration for repeated dashboard loads.
///
/// Each `compute` call is a full recomputation over the records it is
/// given; the engine keeps no derived state between calls.
pub struct ProgressEngine {
    options: ViewOptions,
    encoder: SnapshotEncoder,
}

impl Default for ProgressEngine {
    fn default() -> Self {
        Self::new(ViewOptions::default())
    }
}

impl ProgressEngine {
    /// Create an engine with the given view configuration
    pub fn new(options: ViewOptions) -> Self {
        Self {
            options,
            encoder: SnapshotEncoder::new(),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Compute all chart metrics for a set of canonical records.
    ///
    /// Pure given a fixed reference instant: the same records and options
    /// always produce identical output.
    pub fn compute(&self, records: &[ActivityRecord]) -> ProgressMetrics {
        let reference = self.options.reference.unwrap_or_else(Utc::now);

        let metrics = ProgressMetrics {
            trend: aggregate_overall(records, self.options.windows, reference),
            series: bucket_by_period(records, self.options.granularity, self.options.mode),
            progress: progress_series(records, self.options.granularity),
            radar: radar_dimensions(records),
            targets: self.options.targets.as_ref().and_then(|targets| {
                evaluate_targets(records, targets, self.options.windows, reference)
            }),
        };

        debug!(
            records = records.len(),
            buckets = metrics.series.len(),
            "computed progress metrics"
        );

        metrics
    }

    /// Compute metrics and wrap them in a snapshot payload
    pub fn snapshot(&self, outcome: &AdapterOutcome, source: &str) -> ProgressSnapshot {
        let metrics = self.compute(&outcome.records);
        self.encoder.encode(&metrics, &source_stats(outcome, source))
    }

    /// Compute metrics and encode the snapshot to JSON
    pub fn snapshot_json(
        &self,
        outcome: &AdapterOutcome,
        source: &str,
    ) -> Result<String, MetricsError> {
        let metrics = self.compute(&outcome.records);
        self.encoder
            .encode_to_json(&metrics, &source_stats(outcome, source))
    }
}

fn source_stats(outcome: &AdapterOutcome, source: &str) -> SourceStats {
    let scored_records = outcome
        .records
        .iter()
        .filter(|record| record.score.is_some() && native_scale(&record.kind).is_some())
        .count();

    SourceStats {
        source: source.to_string(),
        records_seen: outcome.records.len(),
        records_skipped: outcome.skipped,
        scored_records,
    }
}
