//! Wire types for the lucinka REST API.
//!
//! Field names match the JSON emitted by the server verbatim. Timestamps are
//! kept as raw strings: a malformed value must not fail the whole collection,
//! so parsing is left to the caller.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::utils::format_api_timestamp;

/// Activity types synthesized from other collections; they cannot be logged directly.
pub const DERIVED_ACTIVITY_TYPES: &[&str] = &["eating", "visit"];

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct ActivityRecord {
    pub id: i64,
    pub activity_type: String,
    pub start_dt: String,
    #[serde(default)]
    pub end_dt: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct BreastfeedingRecord {
    pub id: i64,
    pub start_dt: String,
    pub end_dt: String,
    #[serde(default, deserialize_with = "deserialize_opt_minutes")]
    pub left_duration: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_minutes")]
    pub right_duration: Option<f64>,
    #[serde(default)]
    pub is_pumped: bool,
    #[serde(default = "default_true")]
    pub is_breast: bool,
    #[serde(default)]
    pub ml_amount: Option<i64>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct VisitRecord {
    pub id: i64,
    pub date: String,
    pub doctor: String,
    pub location: String,
    #[serde(rename = "type")]
    pub visit_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct DataEntry {
    pub id: i64,
    pub date: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct PhotoRecord {
    pub id: i64,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub ext: String,
}

impl PhotoRecord {
    /// Name under which the server stores the file.
    pub fn storage_filename(&self) -> String {
        format!("{}{}", self.id, self.ext)
    }
}

/// Durations were stored as integers by the stopwatch and as parsed floats by
/// manual entry; some older rows carry them as strings.
fn deserialize_opt_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected minutes, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!(
            "expected number or string, got {other}"
        ))),
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("end time precedes start time")]
    EndBeforeStart,
    #[error("'{0}' is derived from other records and cannot be logged as an activity")]
    DerivedActivityType(String),
    #[error("feeding durations must be finite and non-negative")]
    InvalidDuration,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NewActivity {
    pub activity_type: String,
    pub start_dt: String,
    pub end_dt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewActivity {
    /// An activity started now and left open until completed.
    pub fn started(activity_type: &str, at: DateTime<Utc>) -> Result<Self, ValidationError> {
        check_loggable(activity_type)?;
        Ok(Self {
            activity_type: activity_type.to_string(),
            start_dt: format_api_timestamp(at),
            end_dt: None,
            notes: None,
        })
    }

    /// A completed activity entered after the fact. Both ends are required.
    pub fn manual(
        activity_type: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        check_loggable(activity_type)?;
        let start = start.ok_or(ValidationError::MissingField("start_dt"))?;
        let end = end.ok_or(ValidationError::MissingField("end_dt"))?;
        if end < start {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(Self {
            activity_type: activity_type.to_string(),
            start_dt: format_api_timestamp(start),
            end_dt: Some(format_api_timestamp(end)),
            notes: None,
        })
    }
}

fn check_loggable(activity_type: &str) -> Result<(), ValidationError> {
    if activity_type.trim().is_empty() {
        return Err(ValidationError::MissingField("activity_type"));
    }
    if DERIVED_ACTIVITY_TYPES.contains(&activity_type) {
        return Err(ValidationError::DerivedActivityType(
            activity_type.to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ActivityCompletion {
    pub end_dt: String,
}

impl ActivityCompletion {
    pub fn at(end: DateTime<Utc>) -> Self {
        Self {
            end_dt: format_api_timestamp(end),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NewBreastfeeding {
    pub start_dt: String,
    pub end_dt: String,
    pub left_duration: f64,
    pub right_duration: f64,
    pub is_pumped: bool,
    pub is_breast: bool,
    pub ml_amount: i64,
}

impl NewBreastfeeding {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        left_minutes: f64,
        right_minutes: f64,
    ) -> Self {
        Self {
            start_dt: format_api_timestamp(start),
            end_dt: format_api_timestamp(end),
            left_duration: left_minutes,
            right_duration: right_minutes,
            is_pumped: false,
            is_breast: true,
            ml_amount: 0,
        }
    }

    /// A session typed in by hand: the end is derived from the per-side minutes.
    pub fn manual(
        start: Option<DateTime<Utc>>,
        left_minutes: f64,
        right_minutes: f64,
    ) -> Result<Self, ValidationError> {
        let start = start.ok_or(ValidationError::MissingField("start_dt"))?;
        let valid = |m: f64| m.is_finite() && m >= 0.0;
        if !valid(left_minutes) || !valid(right_minutes) {
            return Err(ValidationError::InvalidDuration);
        }
        let total_secs = ((left_minutes + right_minutes) * 60.0).round() as i64;
        let end = start + Duration::seconds(total_secs);
        Ok(Self::new(start, end, left_minutes, right_minutes))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NewVisit {
    pub date: String,
    pub doctor: String,
    pub location: String,
    #[serde(rename = "type")]
    pub visit_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NewDataEntry {
    pub date: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn breastfeeding_defaults_apply_for_old_rows() {
        let payload = json!({"id": 7, "start_dt": "2025-10-23T10:00:00", "end_dt": "2025-10-23T10:20:00"});
        let rec: BreastfeedingRecord = serde_json::from_value(payload).expect("decode");
        assert!(!rec.is_pumped);
        assert!(rec.is_breast);
        assert_eq!(rec.left_duration, None);
    }

    #[test]
    fn durations_accept_numbers_and_numeric_strings() {
        let payload = json!({"id": 1, "start_dt": "a", "end_dt": "b", "left_duration": 12, "right_duration": "7.5"});
        let rec: BreastfeedingRecord = serde_json::from_value(payload).expect("decode");
        assert_eq!(rec.left_duration, Some(12.0));
        assert_eq!(rec.right_duration, Some(7.5));
    }

    #[test]
    fn durations_reject_objects() {
        let payload = json!({"id": 1, "start_dt": "a", "end_dt": "b", "left_duration": {"m": 1}});
        let res: Result<BreastfeedingRecord, _> = serde_json::from_value(payload);
        assert!(res.is_err());
    }

    #[test]
    fn visit_type_keeps_wire_name() {
        let v = NewVisit {
            date: "2025-11-02 09:30".into(),
            doctor: "Dr. Novak".into(),
            location: "Brno".into(),
            visit_type: "checkup".into(),
            notes: None,
        };
        let out = serde_json::to_value(&v).expect("encode");
        assert_eq!(out["type"], "checkup");
    }

    #[test]
    fn started_activity_sends_null_end() {
        let at = Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap();
        let a = NewActivity::started("sleeping", at).expect("valid");
        let out = serde_json::to_value(&a).expect("encode");
        assert!(out["end_dt"].is_null());
        assert_eq!(out["start_dt"], "2026-01-12T08:00:00.000Z");
    }

    #[test]
    fn manual_activity_requires_both_ends_in_order() {
        let start = Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap();
        assert_eq!(
            NewActivity::manual("walking", Some(start), None),
            Err(ValidationError::MissingField("end_dt"))
        );
        assert_eq!(
            NewActivity::manual("walking", Some(end), Some(start)),
            Err(ValidationError::EndBeforeStart)
        );
        assert!(NewActivity::manual("walking", Some(start), Some(end)).is_ok());
    }

    #[test]
    fn derived_types_cannot_be_started() {
        let at = Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap();
        assert!(matches!(
            NewActivity::started("eating", at),
            Err(ValidationError::DerivedActivityType(_))
        ));
    }

    #[test]
    fn manual_feeding_derives_end_from_sides() {
        let start = Utc.with_ymd_and_hms(2025, 12, 1, 6, 0, 0).unwrap();
        let s = NewBreastfeeding::manual(Some(start), 10.0, 5.0).expect("valid");
        assert_eq!(s.end_dt, "2025-12-01T06:15:00.000Z");
        assert!(NewBreastfeeding::manual(Some(start), -1.0, 5.0).is_err());
        assert_eq!(
            NewBreastfeeding::manual(None, 1.0, 1.0),
            Err(ValidationError::MissingField("start_dt"))
        );
    }

    #[test]
    fn photo_storage_filename_joins_id_and_extension() {
        let p = PhotoRecord {
            id: 12,
            date: "2025-11-01T10:00:00".into(),
            notes: None,
            ext: ".jpg".into(),
        };
        assert_eq!(p.storage_filename(), "12.jpg");
    }
}
