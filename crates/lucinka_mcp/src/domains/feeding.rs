//! Breastfeeding summaries: per day, per month and by hour of day.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use lucinka_client::BreastfeedingRecord;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

use super::relative_time::{RelativeTime, relative_time};
use super::time::{self, TimeSettings, YearMonth};

fn truthy(minutes: Option<f64>) -> Option<f64> {
    minutes.filter(|m| *m != 0.0 && m.is_finite())
}

/// Minutes of one session: the two sides when both were recorded, the
/// wall-clock span otherwise.
pub fn session_minutes(rec: &BreastfeedingRecord, settings: &TimeSettings) -> Option<i64> {
    if let (Some(l), Some(r)) = (truthy(rec.left_duration), truthy(rec.right_duration)) {
        return Some((l.round() + r.round()) as i64);
    }
    let start = time::parse_instant(&rec.start_dt, settings)?;
    let end = time::parse_instant(&rec.end_dt, settings)?;
    Some((end - start).num_minutes())
}

fn side_minutes(m: Option<f64>) -> i64 {
    m.filter(|m| m.is_finite()).map_or(0, |m| m.floor() as i64)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DailyFeeding {
    pub date_key: String,
    pub label: String,
    pub total_minutes: i64,
    pub left_minutes: i64,
    pub right_minutes: i64,
    pub sessions: u32,
    /// Bottle feedings in the day.
    pub bottle_ml: i64,
    #[serde(skip)]
    #[schemars(skip)]
    pub date: NaiveDate,
}

/// Group sessions by local start day, newest day first.
pub fn daily_feeding(records: &[BreastfeedingRecord], settings: &TimeSettings) -> Vec<DailyFeeding> {
    let mut days: BTreeMap<NaiveDate, DailyFeeding> = BTreeMap::new();
    for rec in records {
        let Some(start) = time::parse_instant(&rec.start_dt, settings) else {
            tracing::debug!(session = rec.id, "skipping feeding with unreadable start");
            continue;
        };
        let date = time::local_date(start, settings);
        let day = days.entry(date).or_insert_with(|| DailyFeeding {
            date_key: time::date_key(date),
            label: time::display_label(date),
            total_minutes: 0,
            left_minutes: 0,
            right_minutes: 0,
            sessions: 0,
            bottle_ml: 0,
            date,
        });
        day.total_minutes += session_minutes(rec, settings).unwrap_or(0).max(0);
        day.left_minutes += side_minutes(rec.left_duration);
        day.right_minutes += side_minutes(rec.right_duration);
        day.sessions += 1;
        if !rec.is_breast {
            day.bottle_ml += rec.ml_amount.unwrap_or(0);
        }
    }
    days.into_values().rev().collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MonthlyFeeding {
    pub month_key: String,
    pub label: String,
    pub total_left: i64,
    pub total_right: i64,
    /// Days in ascending order.
    pub days: Vec<DailyFeeding>,
}

/// Newest month first; days inside a month oldest first.
pub fn monthly_feeding(daily: &[DailyFeeding]) -> Vec<MonthlyFeeding> {
    let mut months: BTreeMap<YearMonth, Vec<DailyFeeding>> = BTreeMap::new();
    for day in daily {
        months.entry(YearMonth::of(day.date)).or_default().push(day.clone());
    }
    months
        .into_iter()
        .rev()
        .map(|(month, mut days)| {
            days.sort_by_key(|d| d.date);
            MonthlyFeeding {
                month_key: month.to_string(),
                label: month.label(),
                total_left: days.iter().map(|d| d.left_minutes).sum(),
                total_right: days.iter().map(|d| d.right_minutes).sum(),
                days,
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct HourlyBin {
    pub hour: u32,
    pub sessions: u32,
    pub total_minutes: f64,
    pub average_minutes: f64,
}

/// 24 bins keyed by local start hour; duration is left plus right.
pub fn hourly_distribution(
    records: &[BreastfeedingRecord],
    settings: &TimeSettings,
) -> Vec<HourlyBin> {
    let mut bins: Vec<HourlyBin> = (0..24)
        .map(|hour| HourlyBin {
            hour,
            sessions: 0,
            total_minutes: 0.0,
            average_minutes: 0.0,
        })
        .collect();
    for rec in records {
        let Some(start) = time::parse_instant(&rec.start_dt, settings) else {
            continue;
        };
        let hour = time::to_local(start, settings).hour() as usize;
        let bin = &mut bins[hour];
        bin.sessions += 1;
        bin.total_minutes += rec.left_duration.unwrap_or(0.0) + rec.right_duration.unwrap_or(0.0);
    }
    for bin in &mut bins {
        if bin.sessions > 0 {
            bin.average_minutes = bin.total_minutes / f64::from(bin.sessions);
        }
    }
    bins
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedingSide {
    Left,
    Right,
    Both,
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct LastFeeding {
    pub session_id: i64,
    /// Local end time (RFC3339).
    pub ended_at: String,
    pub ago: RelativeTime,
    /// e.g. `3 hours ago`.
    pub ago_label: String,
    pub side: FeedingSide,
}

/// The session that ended most recently.
pub fn last_feeding(
    records: &[BreastfeedingRecord],
    now: DateTime<Utc>,
    settings: &TimeSettings,
) -> Option<LastFeeding> {
    let (rec, end) = records
        .iter()
        .filter_map(|r| time::parse_instant(&r.end_dt, settings).map(|e| (r, e)))
        .max_by_key(|(_, e)| *e)?;
    let ago = relative_time(end, now);
    let side = match (truthy(rec.left_duration), truthy(rec.right_duration)) {
        (None, Some(_)) => FeedingSide::Right,
        (Some(_), None) => FeedingSide::Left,
        _ => FeedingSide::Both,
    };
    Some(LastFeeding {
        session_id: rec.id,
        ended_at: time::format_local(end, settings),
        ago_label: ago.to_string(),
        ago,
        side,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct FeedingSummary {
    pub last: Option<LastFeeding>,
    pub daily: Vec<DailyFeeding>,
    pub monthly: Vec<MonthlyFeeding>,
}

pub fn summarize(
    records: &[BreastfeedingRecord],
    now: DateTime<Utc>,
    settings: &TimeSettings,
) -> FeedingSummary {
    let daily = daily_feeding(records, settings);
    FeedingSummary {
        last: last_feeding(records, now, settings),
        monthly: monthly_feeding(&daily),
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(id: i64, start: &str, end: &str, left: Option<f64>, right: Option<f64>) -> BreastfeedingRecord {
        BreastfeedingRecord {
            id,
            start_dt: start.into(),
            end_dt: end.into(),
            left_duration: left,
            right_duration: right,
            is_pumped: false,
            is_breast: true,
            ml_amount: None,
        }
    }

    #[test]
    fn sides_win_when_both_recorded() {
        let s = TimeSettings::utc();
        let both = rec(1, "2026-01-12T06:00:00", "2026-01-12T06:40:00", Some(10.4), Some(12.6));
        assert_eq!(session_minutes(&both, &s), Some(23));
        let one = rec(2, "2026-01-12T06:00:00", "2026-01-12T06:17:50", Some(15.0), Some(0.0));
        assert_eq!(session_minutes(&one, &s), Some(17));
    }

    #[test]
    fn daily_groups_newest_first() {
        let s = TimeSettings::utc();
        let records = vec![
            rec(1, "2026-01-11T06:00:00", "2026-01-11T06:20:00", Some(10.0), Some(10.0)),
            rec(2, "2026-01-12T06:00:00", "2026-01-12T06:20:00", Some(12.0), Some(8.0)),
            rec(3, "2026-01-12T09:00:00", "2026-01-12T09:15:00", None, None),
        ];
        let daily = daily_feeding(&records, &s);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date_key, "2026-01-12");
        assert_eq!(daily[0].total_minutes, 35);
        assert_eq!(daily[0].left_minutes, 12);
        assert_eq!(daily[0].sessions, 2);
    }

    #[test]
    fn monthly_totals_and_order() {
        let s = TimeSettings::utc();
        let records = vec![
            rec(1, "2025-12-30T06:00:00", "2025-12-30T06:20:00", Some(10.0), Some(10.0)),
            rec(2, "2026-01-02T06:00:00", "2026-01-02T06:20:00", Some(12.0), Some(8.0)),
            rec(3, "2026-01-01T06:00:00", "2026-01-01T06:20:00", Some(5.0), Some(5.0)),
        ];
        let months = monthly_feeding(&daily_feeding(&records, &s));
        assert_eq!(months[0].month_key, "2026-01");
        assert_eq!(months[0].total_left, 17);
        assert_eq!(months[0].total_right, 13);
        assert_eq!(months[0].days[0].date_key, "2026-01-01");
        assert_eq!(months[1].month_key, "2025-12");
    }

    #[test]
    fn hourly_bins_average() {
        let s = TimeSettings::utc();
        let records = vec![
            rec(1, "2026-01-11T06:10:00", "x", Some(10.0), Some(10.0)),
            rec(2, "2026-01-12T06:50:00", "x", Some(5.0), None),
            rec(3, "2026-01-12T22:00:00", "x", Some(5.0), Some(5.0)),
        ];
        let bins = hourly_distribution(&records, &s);
        assert_eq!(bins.len(), 24);
        assert_eq!(bins[6].sessions, 2);
        assert_eq!(bins[6].total_minutes, 25.0);
        assert_eq!(bins[6].average_minutes, 12.5);
        assert_eq!(bins[0].average_minutes, 0.0);
    }

    #[test]
    fn last_feeding_reports_side_and_age() {
        let s = TimeSettings::utc();
        let records = vec![
            rec(1, "2026-01-12T06:00:00", "2026-01-12T06:20:00", Some(10.0), Some(10.0)),
            rec(2, "2026-01-12T09:00:00", "2026-01-12T09:15:00", Some(0.0), Some(15.0)),
        ];
        let now = Utc.with_ymd_and_hms(2026, 1, 12, 12, 15, 0).unwrap();
        let last = last_feeding(&records, now, &s).unwrap();
        assert_eq!(last.session_id, 2);
        assert_eq!(last.side, FeedingSide::Right);
        assert_eq!(last.ago_label, "3 hours ago");
        assert!(last_feeding(&[], now, &s).is_none());
    }
}
