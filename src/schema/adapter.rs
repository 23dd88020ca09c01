//! Adapter for converting prep.activity.v1 events to canonical records
//!
//! Parsing is strict about JSON syntax and loose about field shapes: a
//! malformed field extracts to its default, while a malformed envelope
//! (missing kind or timestamp) drops the record with a warning instead of
//! failing the batch.

use tracing::warn;

use crate::error::MetricsError;
use crate::schema::activity::{ActivityEvent, ValidationError};
use crate::types::ActivityRecord;

/// Adapter for converting wire events to canonical records
pub struct ActivityAdapter;

/// Canonical records plus the count of events dropped along the way
#[derive(Debug, Clone, Default)]
pub struct AdapterOutcome {
    /// Accepted records, sorted ascending by timestamp
    pub records: Vec<ActivityRecord>,
    /// Events dropped for envelope problems
    pub skipped: usize,
}

impl ActivityAdapter {
    /// Parse a JSON string containing an array of activity events
    pub fn parse_array(json: &str) -> Result<Vec<ActivityEvent>, MetricsError> {
        let events: Vec<ActivityEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing activity events
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ActivityEvent>, MetricsError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(MetricsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(events)
    }

    /// Convert wire events to canonical records.
    ///
    /// Events with an invalid envelope are skipped, not propagated - the
    /// pipeline must always produce a renderable result.
    pub fn to_canonical(events: &[ActivityEvent]) -> AdapterOutcome {
        let mut outcome = AdapterOutcome::default();

        for event in events {
            if let Err(e) = event.validate() {
                warn!(
                    event_id = event.id.as_deref().unwrap_or("unknown"),
                    error = %e,
                    "skipping activity event"
                );
                outcome.skipped += 1;
                continue;
            }

            // validate() has already checked both; extraction stays total
            let (Some(kind), Some(timestamp)) =
                (event.kind.clone(), event.extract_timestamp())
            else {
                outcome.skipped += 1;
                continue;
            };

            outcome.records.push(ActivityRecord {
                kind,
                score: event.extract_score(),
                duration_minutes: event.extract_duration_minutes(),
                timestamp,
                skill_scores: event.extract_skill_scores(),
            });
        }

        outcome.records.sort_by_key(|record| record.timestamp);
        outcome
    }

    /// Validate a batch of events, reporting only failures
    pub fn validate_events(events: &[ActivityEvent]) -> Vec<ValidationResult> {
        events
            .iter()
            .enumerate()
            .filter_map(|(idx, event)| {
                event.validate().err().map(|error| ValidationResult {
                    index: idx,
                    event_id: event.id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// One failed event from a validation pass
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub event_id: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityKind, Dimension};

    fn sample_array() -> &'static str {
        r#"[
            {"type": "quiz", "score": 8, "duration": 20, "timestamp": "2025-03-10T09:00:00Z"},
            {"type": "interview", "score": 72, "timestamp": "2025-03-10T15:30:00Z",
             "skillScores": {"COMM": 68, "FUND": 75}},
            {"type": "eq", "score": "6.5", "timestamp": "2025-03-11T10:00:00Z"},
            {"type": "goal-completed", "timestamp": 1741687200000}
        ]"#
    }

    #[test]
    fn test_parse_and_convert() {
        let events = ActivityAdapter::parse_array(sample_array()).unwrap();
        assert_eq!(events.len(), 4);

        let outcome = ActivityAdapter::to_canonical(&events);
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.skipped, 0);

        // Sorted ascending by timestamp
        let kinds: Vec<&ActivityKind> = outcome.records.iter().map(|r| &r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ActivityKind::Quiz,
                &ActivityKind::Interview,
                &ActivityKind::Test,
                &ActivityKind::GoalCompleted
            ]
        );

        let interview = &outcome.records[1];
        assert_eq!(interview.score, Some(72.0));
        assert_eq!(
            interview.skill_scores.get(&Dimension::Communication),
            Some(&68.0)
        );
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"type\": \"quiz\", \"timestamp\": \"2025-03-10T09:00:00Z\"}\n\nnot json\n";
        let err = ActivityAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_invalid_envelopes_are_skipped() {
        let json = r#"[
            {"type": "quiz", "score": 8, "timestamp": "2025-03-10T09:00:00Z"},
            {"type": "brainstorm", "timestamp": "2025-03-10T10:00:00Z"},
            {"type": "practice"},
            {"score": 50, "timestamp": "2025-03-10T11:00:00Z"}
        ]"#;

        let events = ActivityAdapter::parse_array(json).unwrap();
        let outcome = ActivityAdapter::to_canonical(&events);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 3);

        let failures = ActivityAdapter::validate_events(&events);
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0].index, 1);
    }

    #[test]
    fn test_malformed_fields_keep_the_record() {
        let json = r#"[
            {"type": "quiz", "score": "??", "duration": "soon",
             "timestamp": "2025-03-10T09:00:00Z",
             "skillScores": {"FUND": "high", "COMM": 60, "luck": 90}}
        ]"#;

        let events = ActivityAdapter::parse_array(json).unwrap();
        let outcome = ActivityAdapter::to_canonical(&events);

        assert_eq!(outcome.skipped, 0);
        let record = &outcome.records[0];
        assert_eq!(record.score, None);
        assert_eq!(record.duration_minutes, 0);
        assert_eq!(record.skill_scores.len(), 1);
        assert_eq!(
            record.skill_scores.get(&Dimension::Communication),
            Some(&60.0)
        );
    }
}
