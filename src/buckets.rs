//! Period bucketing
//!
//! Groups records into day/month/year buckets for the per-type chart series
//! and the overall progress line. Period keys are zero-padded ISO fragments,
//! so lexical order is chronological order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::normalizer::normalize_score;
use crate::radar::radar_dimensions_iter;
use crate::trend::MeanAccumulator;
use crate::types::{
    ActivityKind, ActivityRecord, BucketMode, Granularity, NormalizedPoint, PeriodBucket,
};

/// Derive the bucket key for a timestamp at the requested granularity
pub fn period_key(timestamp: DateTime<Utc>, granularity: Granularity) -> String {
    let format = match granularity {
        Granularity::Day => "%Y-%m-%d",
        Granularity::Month => "%Y-%m",
        Granularity::Year => "%Y",
    };
    timestamp.format(format).to_string()
}

#[derive(Default)]
struct TypeAccumulator {
    quiz: MeanAccumulator,
    quiz_count: usize,
    test: MeanAccumulator,
    test_count: usize,
    interview: MeanAccumulator,
    interview_count: usize,
}

impl TypeAccumulator {
    fn add(&mut self, record: &ActivityRecord) {
        match record.kind {
            ActivityKind::Quiz => {
                self.quiz.push(normalize_score(record));
                self.quiz_count += 1;
            }
            ActivityKind::Test => {
                self.test.push(normalize_score(record));
                self.test_count += 1;
            }
            ActivityKind::Interview => {
                self.interview.push(normalize_score(record));
                self.interview_count += 1;
            }
            // Other kinds create the bucket but no per-type value
            _ => {}
        }
    }

    fn into_bucket(self, period: String, mode: BucketMode) -> PeriodBucket {
        match mode {
            BucketMode::Score => PeriodBucket {
                period,
                quiz: self.quiz.mean(),
                test: self.test.mean(),
                interview: self.interview.mean(),
            },
            BucketMode::Count => PeriodBucket {
                period,
                quiz: self.quiz_count as f64,
                test: self.test_count as f64,
                interview: self.interview_count as f64,
            },
        }
    }
}

/// Group records into period buckets with per-type values.
///
/// Any record of any kind creates its period's bucket; only quiz, test, and
/// interview records populate the type fields, and a type with no records in
/// a bucket reports 0. Output is sorted ascending by period key.
pub fn bucket_by_period(
    records: &[ActivityRecord],
    granularity: Granularity,
    mode: BucketMode,
) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<String, TypeAccumulator> = BTreeMap::new();

    for record in records {
        let key = period_key(record.timestamp, granularity);
        buckets.entry(key).or_default().add(record);
    }

    buckets
        .into_iter()
        .map(|(period, acc)| acc.into_bucket(period, mode))
        .collect()
}

/// Build the cross-type progress series: one point per period with the
/// bucket's overall mean normalized score and per-dimension means
pub fn progress_series(
    records: &[ActivityRecord],
    granularity: Granularity,
) -> Vec<NormalizedPoint> {
    let mut buckets: BTreeMap<String, Vec<&ActivityRecord>> = BTreeMap::new();

    for record in records {
        let key = period_key(record.timestamp, granularity);
        buckets.entry(key).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(period, members)| {
            let mut overall = MeanAccumulator::default();
            for record in &members {
                overall.push(normalize_score(record));
            }
            NormalizedPoint {
                period,
                overall: overall.mean(),
                dimensions: radar_dimensions_iter(members.iter().copied()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimension;
    use chrono::TimeZone;
    use std::collections::BTreeMap as Map;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn record(kind: ActivityKind, score: Option<f64>, timestamp: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord {
            kind,
            score,
            duration_minutes: 0,
            timestamp,
            skill_scores: Map::new(),
        }
    }

    fn two_day_log() -> Vec<ActivityRecord> {
        vec![
            record(ActivityKind::Quiz, Some(8.0), at(10, 9)),
            record(ActivityKind::Interview, Some(72.0), at(10, 15)),
            record(ActivityKind::Quiz, Some(5.0), at(11, 9)),
        ]
    }

    #[test]
    fn test_period_keys() {
        let ts = at(10, 9);
        assert_eq!(period_key(ts, Granularity::Day), "2025-03-10");
        assert_eq!(period_key(ts, Granularity::Month), "2025-03");
        assert_eq!(period_key(ts, Granularity::Year), "2025");
    }

    #[test]
    fn test_score_mode_scenario() {
        let buckets = bucket_by_period(&two_day_log(), Granularity::Day, BucketMode::Score);
        assert_eq!(buckets.len(), 2);

        let day1 = &buckets[0];
        assert_eq!(day1.period, "2025-03-10");
        assert_eq!(day1.quiz, 80.0);
        assert_eq!(day1.interview, 72.0);
        assert_eq!(day1.test, 0.0);

        let day2 = &buckets[1];
        assert_eq!(day2.period, "2025-03-11");
        assert_eq!(day2.quiz, 50.0);
        assert_eq!(day2.interview, 0.0);
        assert_eq!(day2.test, 0.0);
    }

    #[test]
    fn test_count_mode_scenario() {
        let buckets = bucket_by_period(&two_day_log(), Granularity::Day, BucketMode::Count);

        assert_eq!(buckets[0].quiz, 1.0);
        assert_eq!(buckets[0].interview, 1.0);
        assert_eq!(buckets[0].test, 0.0);
        assert_eq!(buckets[1].quiz, 1.0);
        assert_eq!(buckets[1].interview, 0.0);
    }

    #[test]
    fn test_modes_differ_when_scores_do() {
        let records = two_day_log();
        let score = bucket_by_period(&records, Granularity::Day, BucketMode::Score);
        let count = bucket_by_period(&records, Granularity::Day, BucketMode::Count);
        assert_ne!(score[0].quiz, count[0].quiz);
    }

    #[test]
    fn test_empty_input() {
        assert!(bucket_by_period(&[], Granularity::Day, BucketMode::Score).is_empty());
        assert!(progress_series(&[], Granularity::Month).is_empty());
    }

    #[test]
    fn test_unscored_kinds_still_create_buckets() {
        let records = vec![record(ActivityKind::GoalCompleted, None, at(12, 10))];
        let buckets = bucket_by_period(&records, Granularity::Day, BucketMode::Count);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].period, "2025-03-12");
        assert_eq!(buckets[0].quiz, 0.0);
        assert_eq!(buckets[0].test, 0.0);
        assert_eq!(buckets[0].interview, 0.0);
    }

    #[test]
    fn test_monthly_rollup_sorted() {
        let records = vec![
            record(ActivityKind::Quiz, Some(6.0), Utc.with_ymd_and_hms(2025, 2, 20, 9, 0, 0).unwrap()),
            record(ActivityKind::Quiz, Some(8.0), at(10, 9)),
            record(ActivityKind::Quiz, Some(4.0), Utc.with_ymd_and_hms(2024, 12, 5, 9, 0, 0).unwrap()),
        ];
        let buckets = bucket_by_period(&records, Granularity::Month, BucketMode::Score);

        let periods: Vec<&str> = buckets.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-12", "2025-02", "2025-03"]);
    }

    #[test]
    fn test_progress_series_overall_and_dimensions() {
        let mut with_skills = record(ActivityKind::Interview, Some(72.0), at(10, 15));
        with_skills
            .skill_scores
            .insert(Dimension::Communication, 68.0);

        let records = vec![
            record(ActivityKind::Quiz, Some(8.0), at(10, 9)),
            with_skills,
            record(ActivityKind::Quiz, Some(5.0), at(11, 9)),
        ];

        let series = progress_series(&records, Granularity::Day);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].overall, 76.0);
        assert_eq!(series[0].dimensions.communication, 68.0);
        assert_eq!(series[0].dimensions.domain, 0.0);
        assert_eq!(series[1].overall, 50.0);
    }
}
