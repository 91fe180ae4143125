//! English relative-time phrases ("3 hours ago", "yesterday", "in 2 days").

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    const ALL: [TimeUnit; 7] = [
        TimeUnit::Year,
        TimeUnit::Month,
        TimeUnit::Week,
        TimeUnit::Day,
        TimeUnit::Hour,
        TimeUnit::Minute,
        TimeUnit::Second,
    ];

    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Year => 31_536_000.0,
            TimeUnit::Month => 2_592_000.0,
            TimeUnit::Week => 604_800.0,
            TimeUnit::Day => 86_400.0,
            TimeUnit::Hour => 3_600.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Second => 1.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Month => "month",
            TimeUnit::Week => "week",
            TimeUnit::Day => "day",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
        }
    }
}

/// Signed amount of a unit; negative values lie in the past.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RelativeTime {
    pub value: i64,
    pub unit: TimeUnit,
}

/// Largest unit with a ratio of at least one, rounded to the nearest whole.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> RelativeTime {
    let diff_ms = (then - now).num_milliseconds();
    let seconds = (diff_ms as f64).abs() / 1000.0;
    let sign = if diff_ms < 0 { -1 } else { 1 };
    TimeUnit::ALL
        .iter()
        .find(|u| seconds / u.seconds() >= 1.0)
        .map(|u| RelativeTime {
            value: sign * (seconds / u.seconds()).round() as i64,
            unit: *u,
        })
        .unwrap_or(RelativeTime {
            value: 0,
            unit: TimeUnit::Second,
        })
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let special = match (self.unit, self.value) {
            (TimeUnit::Second, 0) => Some("now"),
            (TimeUnit::Day, -1) => Some("yesterday"),
            (TimeUnit::Day, 1) => Some("tomorrow"),
            (TimeUnit::Day, 0) => Some("today"),
            (TimeUnit::Minute, 0) => Some("this minute"),
            (TimeUnit::Hour, 0) => Some("this hour"),
            (TimeUnit::Week, -1) => Some("last week"),
            (TimeUnit::Week, 1) => Some("next week"),
            (TimeUnit::Month, -1) => Some("last month"),
            (TimeUnit::Month, 1) => Some("next month"),
            (TimeUnit::Year, -1) => Some("last year"),
            (TimeUnit::Year, 1) => Some("next year"),
            _ => None,
        };
        if let Some(s) = special {
            return f.write_str(s);
        }
        let n = self.value.abs();
        let plural = if n == 1 { "" } else { "s" };
        if self.value < 0 {
            write!(f, "{n} {}{plural} ago", self.unit.name())
        } else {
            write!(f, "in {n} {}{plural}", self.unit.name())
        }
    }
}
