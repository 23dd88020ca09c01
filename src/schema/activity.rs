//! prep.activity.v1 schema definition
//!
//! The wire shape of one logged activity, as emitted by the upstream
//! aggregation endpoint. Producers were written independently over time, so
//! field types are loose: scores arrive as numbers or numeric strings,
//! timestamps as RFC 3339 strings, date strings, or epoch values, and skill
//! labels under several naming schemes. Extraction is total - every accessor
//! returns a default on shape mismatch instead of failing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::types::{ActivityKind, Dimension};

/// Current schema version
pub const SCHEMA_VERSION: &str = "prep.activity.v1";

/// Epoch values at or above this are milliseconds, below are seconds
const EPOCH_MILLIS_CUTOFF: i64 = 1_000_000_000_000;

/// One activity event as it appears on the wire.
///
/// Unknown extra fields are ignored on deserialization; known fields keep
/// their raw JSON shape until extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Activity kind; absent or unrecognized kinds fail validation
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActivityKind>,
    /// Raw score value (number, numeric string, or garbage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    /// Raw duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    /// Raw timestamp (RFC 3339, date string, or epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Raw per-skill sub-scores keyed by producer label
    #[serde(
        default,
        alias = "skillScores",
        skip_serializing_if = "Option::is_none"
    )]
    pub skill_scores: Option<HashMap<String, Value>>,
    /// Upstream record identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ActivityEvent {
    /// Create an event with the given kind and timestamp
    pub fn new(kind: ActivityKind, timestamp: DateTime<Utc>) -> Self {
        ActivityEvent {
            kind: Some(kind),
            score: None,
            duration: None,
            timestamp: Some(Value::String(timestamp.to_rfc3339())),
            skill_scores: None,
            id: None,
        }
    }

    /// Attach a numeric score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(Value::from(score));
        self
    }

    /// Attach a duration in minutes
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(Value::from(minutes));
        self
    }

    /// Attach skill sub-scores keyed by producer label
    pub fn with_skill_scores<I, S>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.skill_scores = Some(
            scores
                .into_iter()
                .map(|(label, value)| (label.into(), Value::from(value)))
                .collect(),
        );
        self
    }

    /// Extract the score as a finite number, if the producer sent one
    pub fn extract_score(&self) -> Option<f64> {
        self.score.as_ref().and_then(numeric)
    }

    /// Extract the duration in minutes; malformed or negative values are 0
    pub fn extract_duration_minutes(&self) -> u32 {
        self.duration
            .as_ref()
            .and_then(numeric)
            .map(|minutes| minutes.max(0.0) as u32)
            .unwrap_or(0)
    }

    /// Extract the timestamp as a UTC instant.
    ///
    /// Accepts RFC 3339 strings, plain `YYYY-MM-DD` dates (midnight UTC),
    /// and epoch seconds or milliseconds.
    pub fn extract_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            Value::String(text) => parse_timestamp_str(text),
            Value::Number(number) => number.as_i64().and_then(parse_epoch),
            _ => None,
        }
    }

    /// Extract skill sub-scores onto canonical dimension keys.
    ///
    /// Unknown labels and non-numeric values are dropped. When two aliases
    /// of the same dimension appear, the lexically later label wins.
    pub fn extract_skill_scores(&self) -> BTreeMap<Dimension, f64> {
        let mut scores = BTreeMap::new();
        if let Some(raw) = &self.skill_scores {
            let mut labels: Vec<&String> = raw.keys().collect();
            labels.sort();
            for label in labels {
                if let (Some(dimension), Some(value)) =
                    (Dimension::from_label(label), raw.get(label).and_then(numeric))
                {
                    scores.insert(dimension, value);
                }
            }
        }
        scores
    }

    /// Validate the event envelope
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            None => return Err(ValidationError::MissingKind),
            Some(ActivityKind::Other(name)) => {
                return Err(ValidationError::UnknownKind(name.clone()));
            }
            Some(_) => {}
        }

        if self.timestamp.is_none() {
            return Err(ValidationError::MissingTimestamp);
        }
        if self.extract_timestamp().is_none() {
            return Err(ValidationError::InvalidTimestamp(
                self.timestamp
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            ));
        }

        Ok(())
    }
}

/// Coerce a JSON value to a finite number.
///
/// Numeric strings are accepted because upstream JavaScript producers emit
/// `"8"` as readily as `8`.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    // Date-only producers: midnight UTC
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value >= EPOCH_MILLIS_CUTOFF {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Validation errors for activity events
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Event has no type field")]
    MissingKind,

    #[error("Unknown activity type: {0}")]
    UnknownKind(String),

    #[error("Event has no timestamp field")]
    MissingTimestamp,

    #[error("Unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_loose_event() {
        let json = r#"{
            "type": "quiz",
            "score": "8",
            "duration": 25,
            "timestamp": "2025-03-10T14:00:00Z",
            "skillScores": { "FUND": 70, "COMM": "55" },
            "jobRoleId": "backend-7",
            "attempts": 2
        }"#;

        let event: ActivityEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, Some(ActivityKind::Quiz));
        assert_eq!(event.extract_score(), Some(8.0));
        assert_eq!(event.extract_duration_minutes(), 25);

        let skills = event.extract_skill_scores();
        assert_eq!(skills.get(&Dimension::Fundamental), Some(&70.0));
        assert_eq!(skills.get(&Dimension::Communication), Some(&55.0));
    }

    #[test]
    fn test_score_extraction_is_total() {
        let mut event = ActivityEvent::new(ActivityKind::Quiz, Utc::now());
        assert_eq!(event.extract_score(), None);

        event.score = Some(Value::String("not a number".to_string()));
        assert_eq!(event.extract_score(), None);

        event.score = Some(Value::Bool(true));
        assert_eq!(event.extract_score(), None);

        event.score = Some(Value::from(7.5));
        assert_eq!(event.extract_score(), Some(7.5));
    }

    #[test]
    fn test_duration_defaults_to_zero() {
        let mut event = ActivityEvent::new(ActivityKind::Practice, Utc::now());
        assert_eq!(event.extract_duration_minutes(), 0);

        event.duration = Some(Value::from(-10));
        assert_eq!(event.extract_duration_minutes(), 0);

        event.duration = Some(Value::from(45));
        assert_eq!(event.extract_duration_minutes(), 45);
    }

    #[test]
    fn test_timestamp_formats_agree() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();

        let mut event = ActivityEvent::new(ActivityKind::Quiz, expected);
        assert_eq!(event.extract_timestamp(), Some(expected));

        event.timestamp = Some(Value::from(expected.timestamp_millis()));
        assert_eq!(event.extract_timestamp(), Some(expected));

        event.timestamp = Some(Value::from(expected.timestamp()));
        assert_eq!(event.extract_timestamp(), Some(expected));

        event.timestamp = Some(Value::String("2025-03-10".to_string()));
        assert_eq!(
            event.extract_timestamp(),
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_validation() {
        let event = ActivityEvent::new(ActivityKind::Interview, Utc::now());
        assert!(event.validate().is_ok());

        let no_kind = ActivityEvent {
            kind: None,
            ..event.clone()
        };
        assert!(matches!(
            no_kind.validate(),
            Err(ValidationError::MissingKind)
        ));

        let unknown = ActivityEvent {
            kind: Some(ActivityKind::Other("brainstorm".to_string())),
            ..event.clone()
        };
        assert!(matches!(
            unknown.validate(),
            Err(ValidationError::UnknownKind(_))
        ));

        let bad_ts = ActivityEvent {
            timestamp: Some(Value::String("soon".to_string())),
            ..event
        };
        assert!(matches!(
            bad_ts.validate(),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }
}
