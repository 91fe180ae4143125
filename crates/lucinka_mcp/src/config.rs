use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use lucinka_client::utils::parse_api_timestamp;
use std::path::PathBuf;

use crate::domains::buckets::SpanPolicy;
use crate::domains::growth::DEFAULT_REFERENCE_LIMIT;
use crate::domains::time::{LegacyCorrection, TimeSettings};
use crate::error::McpError;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Prague;

/// Settings for the aggregation side of the server.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyticsConfig {
    pub time: TimeSettings,
    pub birth_date: NaiveDate,
    /// JSON preference file; preferences live in memory when unset.
    pub preferences_path: Option<PathBuf>,
    pub growth_reference_limit: usize,
    pub span_policy: SpanPolicy,
}

fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 10).unwrap_or_default()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            time: TimeSettings::default(),
            birth_date: default_birth_date(),
            preferences_path: None,
            growth_reference_limit: DEFAULT_REFERENCE_LIMIT,
            span_policy: SpanPolicy::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> Result<Self, McpError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, McpError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let timezone = match get("LUCINKA_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| McpError::Config(format!("unknown timezone '{name}'")))?,
            None => DEFAULT_TIMEZONE,
        };

        let legacy = match get("LUCINKA_LEGACY_CUTOVER") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => LegacyCorrection::none(),
            Some(raw) => {
                let cutover = parse_api_timestamp(&raw).ok_or_else(|| {
                    McpError::Config(format!("LUCINKA_LEGACY_CUTOVER: cannot parse '{raw}'"))
                })?;
                LegacyCorrection::new(cutover, Duration::hours(1))
            }
            None => LegacyCorrection::default(),
        };

        let birth_date = match get("LUCINKA_BIRTH_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                McpError::Config(format!("LUCINKA_BIRTH_DATE: {e}"))
            })?,
            None => default_birth_date(),
        };

        let growth_reference_limit = match get("LUCINKA_GROWTH_REFERENCE_LIMIT") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                McpError::Config(format!("LUCINKA_GROWTH_REFERENCE_LIMIT: {e}"))
            })?,
            None => DEFAULT_REFERENCE_LIMIT,
        };

        let span_policy = match get("LUCINKA_SPAN_POLICY").as_deref().map(str::trim) {
            None | Some("fill") => SpanPolicy::FillIntermediateDays,
            Some("first_last") => SpanPolicy::FirstAndLastOnly,
            Some(other) => {
                return Err(McpError::Config(format!(
                    "LUCINKA_SPAN_POLICY: expected 'fill' or 'first_last', got '{other}'"
                )));
            }
        };

        Ok(Self {
            time: TimeSettings::new(timezone, legacy),
            birth_date,
            preferences_path: get("LUCINKA_PREFERENCES_PATH").map(PathBuf::from),
            growth_reference_limit,
            span_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = AnalyticsConfig::from_env_with(|_| None).unwrap();
        assert_eq!(cfg, AnalyticsConfig::default());
        assert_eq!(cfg.time.timezone, chrono_tz::Europe::Prague);
        assert_eq!(cfg.birth_date, NaiveDate::from_ymd_opt(2025, 10, 10).unwrap());
        assert_eq!(cfg.growth_reference_limit, 7);
    }

    #[test]
    fn reads_overrides() {
        let get = |k: &str| match k {
            "LUCINKA_TIMEZONE" => Some("America/New_York".into()),
            "LUCINKA_BIRTH_DATE" => Some("2024-02-29".into()),
            "LUCINKA_LEGACY_CUTOVER" => Some("2025-06-01".into()),
            "LUCINKA_PREFERENCES_PATH" => Some("/tmp/prefs.json".into()),
            "LUCINKA_GROWTH_REFERENCE_LIMIT" => Some("13".into()),
            "LUCINKA_SPAN_POLICY" => Some("first_last".into()),
            _ => None,
        };
        let cfg = AnalyticsConfig::from_env_with(get).unwrap();
        assert_eq!(cfg.time.timezone, chrono_tz::America::New_York);
        assert_eq!(
            cfg.time.legacy.cutover(),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(cfg.preferences_path, Some(PathBuf::from("/tmp/prefs.json")));
        assert_eq!(cfg.growth_reference_limit, 13);
        assert_eq!(cfg.span_policy, SpanPolicy::FirstAndLastOnly);
    }

    #[test]
    fn legacy_correction_can_be_disabled() {
        let get = |k: &str| (k == "LUCINKA_LEGACY_CUTOVER").then(|| "none".to_string());
        let cfg = AnalyticsConfig::from_env_with(get).unwrap();
        assert_eq!(cfg.time.legacy, LegacyCorrection::none());
    }

    #[test]
    fn rejects_bad_values() {
        let tz = |k: &str| (k == "LUCINKA_TIMEZONE").then(|| "Mars/Olympus".to_string());
        assert!(matches!(
            AnalyticsConfig::from_env_with(tz),
            Err(McpError::Config(_))
        ));
        let birth = |k: &str| (k == "LUCINKA_BIRTH_DATE").then(|| "10/10/2025".to_string());
        assert!(AnalyticsConfig::from_env_with(birth).is_err());
    }
}
