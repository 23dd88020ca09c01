//! Radar dimension summaries
//!
//! Averages per-dimension skill sub-scores across all records that report
//! them. A plain grouped mean, no weighting; dimensions with no contributing
//! records report 0.

use crate::trend::MeanAccumulator;
use crate::types::{ActivityRecord, RadarSummary, DIMENSIONS};

/// Summarize skill sub-scores across a slice of records
pub fn radar_dimensions(records: &[ActivityRecord]) -> RadarSummary {
    radar_dimensions_iter(records.iter())
}

/// Summarize skill sub-scores over any record iterator.
///
/// Sub-scores are clamped to 0-100 before averaging so one rogue producer
/// cannot push an axis off the chart.
pub(crate) fn radar_dimensions_iter<'a, I>(records: I) -> RadarSummary
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut accumulators = [
        MeanAccumulator::default(),
        MeanAccumulator::default(),
        MeanAccumulator::default(),
        MeanAccumulator::default(),
    ];

    for record in records {
        for (axis, dimension) in DIMENSIONS.iter().enumerate() {
            if let Some(value) = record.skill_scores.get(dimension) {
                if value.is_finite() {
                    accumulators[axis].push(value.clamp(0.0, 100.0));
                }
            }
        }
    }

    let mut summary = RadarSummary::default();
    for (axis, dimension) in DIMENSIONS.iter().enumerate() {
        summary.set(*dimension, accumulators[axis].mean());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityKind, Dimension};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(skills: &[(Dimension, f64)]) -> ActivityRecord {
        ActivityRecord {
            kind: ActivityKind::Interview,
            score: Some(70.0),
            duration_minutes: 30,
            timestamp: Utc::now(),
            skill_scores: skills.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let summary = radar_dimensions(&[]);
        assert_eq!(summary, RadarSummary::default());
    }

    #[test]
    fn test_grouped_means() {
        let records = vec![
            record(&[(Dimension::Fundamental, 80.0), (Dimension::Communication, 60.0)]),
            record(&[(Dimension::Fundamental, 60.0)]),
            record(&[(Dimension::Domain, 45.0)]),
        ];

        let summary = radar_dimensions(&records);
        assert_eq!(summary.fundamental, 70.0);
        assert_eq!(summary.communication, 60.0);
        assert_eq!(summary.domain, 45.0);
        // No record reported problem solving
        assert_eq!(summary.problem_solving, 0.0);
    }

    #[test]
    fn test_records_without_skills_do_not_dilute() {
        let mut bare = record(&[]);
        bare.skill_scores.clear();

        let records = vec![record(&[(Dimension::Communication, 50.0)]), bare];
        let summary = radar_dimensions(&records);
        assert_eq!(summary.communication, 50.0);
    }

    #[test]
    fn test_sub_scores_clamped() {
        let records = vec![
            record(&[(Dimension::Domain, 150.0)]),
            record(&[(Dimension::Domain, -30.0)]),
        ];
        let summary = radar_dimensions(&records);
        assert_eq!(summary.domain, 50.0);
    }
}
