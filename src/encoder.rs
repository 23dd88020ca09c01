//! Snapshot encoding
//!
//! Encodes computed metrics into the versioned prep.progress.v1 payload
//! consumed by charting clients. Ensures producer, provenance, and quality
//! fields are always present.

use chrono::Utc;
use uuid::Uuid;

use crate::error::MetricsError;
use crate::types::{
    ProgressMetrics, ProgressSnapshot, SnapshotProducer, SnapshotProvenance, SnapshotQuality,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "prep.progress.v1";

/// Where the records came from and how the adapter fared on them
#[derive(Debug, Clone)]
pub struct SourceStats {
    /// Endpoint URL, file path, or "stdin"
    pub source: String,
    /// Records accepted by the adapter
    pub records_seen: usize,
    /// Events the adapter dropped
    pub records_skipped: usize,
    /// Accepted records carrying a usable score
    pub scored_records: usize,
}

impl SourceStats {
    pub fn new(source: impl Into<String>) -> Self {
        SourceStats {
            source: source.into(),
            records_seen: 0,
            records_skipped: 0,
            scored_records: 0,
        }
    }
}

/// Encoder for producing prep.progress.v1 payloads
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode metrics into a snapshot payload
    pub fn encode(&self, metrics: &ProgressMetrics, stats: &SourceStats) -> ProgressSnapshot {
        let producer = SnapshotProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = SnapshotProvenance {
            source: stats.source.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        ProgressSnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            producer,
            provenance,
            quality: build_quality(stats),
            trend: metrics.trend.clone(),
            series: metrics.series.clone(),
            progress: metrics.progress.clone(),
            radar: metrics.radar,
            targets: metrics.targets.clone(),
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        &self,
        metrics: &ProgressMetrics,
        stats: &SourceStats,
    ) -> Result<String, MetricsError> {
        let snapshot = self.encode(metrics, stats);
        serde_json::to_string_pretty(&snapshot).map_err(MetricsError::JsonError)
    }
}

fn build_quality(stats: &SourceStats) -> SnapshotQuality {
    let coverage = if stats.records_seen == 0 {
        0.0
    } else {
        stats.scored_records as f64 / stats.records_seen as f64
    };

    let mut flags = Vec::new();
    if stats.records_seen == 0 {
        flags.push("no_records".to_string());
    } else if stats.scored_records < stats.records_seen {
        flags.push("missing_scores".to_string());
    }
    if stats.records_skipped > 0 {
        flags.push("skipped_records".to_string());
    }

    SnapshotQuality {
        records_seen: stats.records_seen,
        records_skipped: stats.records_skipped,
        coverage,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RadarSummary, TrendSummary};

    fn empty_metrics() -> ProgressMetrics {
        ProgressMetrics {
            trend: TrendSummary {
                current: 0.0,
                previous: 0.0,
                delta: 0.0,
            },
            series: Vec::new(),
            progress: Vec::new(),
            radar: RadarSummary::default(),
            targets: None,
        }
    }

    #[test]
    fn test_encode_empty_input() {
        let encoder = SnapshotEncoder::with_instance_id("test-instance".to_string());
        let stats = SourceStats::new("stdin");
        let snapshot = encoder.encode(&empty_metrics(), &stats);

        assert_eq!(snapshot.snapshot_version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.producer.name, PRODUCER_NAME);
        assert_eq!(snapshot.producer.instance_id, "test-instance");
        assert_eq!(snapshot.quality.records_seen, 0);
        assert_eq!(snapshot.quality.coverage, 0.0);
        assert!(snapshot.quality.flags.contains(&"no_records".to_string()));
    }

    #[test]
    fn test_quality_flags() {
        let stats = SourceStats {
            source: "https://example.test/api/activity".to_string(),
            records_seen: 10,
            records_skipped: 2,
            scored_records: 7,
        };
        let quality = build_quality(&stats);

        assert_eq!(quality.coverage, 0.7);
        assert!(quality.flags.contains(&"missing_scores".to_string()));
        assert!(quality.flags.contains(&"skipped_records".to_string()));
        assert!(!quality.flags.contains(&"no_records".to_string()));
    }

    #[test]
    fn test_encode_to_json_is_valid() {
        let encoder = SnapshotEncoder::new();
        let json = encoder
            .encode_to_json(&empty_metrics(), &SourceStats::new("stdin"))
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("snapshot_version").is_some());
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("provenance").is_some());
        assert!(parsed.get("quality").is_some());
        assert!(parsed.get("trend").is_some());
        assert!(parsed.get("radar").is_some());
        // Unconfigured targets are omitted entirely
        assert!(parsed.get("targets").is_none());
    }
}
