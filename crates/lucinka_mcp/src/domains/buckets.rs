//! Day and month bucketing of sessions on the local 24h clock.
//!
//! A session that crosses local midnight becomes one slice per calendar day it
//! touches. Each slice carries two lengths:
//! - `duration_minutes`: what a chart draws, never below 1 so zero-length
//!   sessions stay visible
//! - `statistical_minutes`: the elapsed length used for totals

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

use super::sessions::{Session, SessionSource};
use super::time::{self, MINUTES_PER_DAY, TimeSettings, YearMonth};

/// Decides which local days appear in a view.
pub trait DayFilter {
    fn includes(&self, date: NaiveDate) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AllDays;

impl DayFilter for AllDays {
    fn includes(&self, _date: NaiveDate) -> bool {
        true
    }
}

impl<F> DayFilter for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn includes(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Month selection used by the timeline views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonthFilter {
    AllDays,
    Month(YearMonth),
}

impl MonthFilter {
    /// Admins see every day; everyone else sees the selected month.
    pub fn for_viewer(is_admin: bool, month: YearMonth) -> Self {
        if is_admin {
            MonthFilter::AllDays
        } else {
            MonthFilter::Month(month)
        }
    }
}

impl DayFilter for MonthFilter {
    fn includes(&self, date: NaiveDate) -> bool {
        match self {
            MonthFilter::AllDays => true,
            MonthFilter::Month(m) => m.contains(date),
        }
    }
}

/// What to do with the days strictly between the start and end day of a
/// session spanning more than one midnight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpanPolicy {
    #[default]
    FillIntermediateDays,
    /// Only the first and last day get a slice; the days in between are lost.
    FirstAndLastOnly,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct IntervalSlice {
    pub activity_type: String,
    pub start_minute_of_day: u16,
    pub duration_minutes: u16,
    pub statistical_minutes: u16,
    pub source_session_id: String,
    pub source: SessionSource,
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct DayBucket {
    pub date_key: String,
    pub display_label: String,
    pub full_label: String,
    pub slices: Vec<IntervalSlice>,
    #[serde(skip)]
    #[schemars(skip)]
    pub date: NaiveDate,
}

impl DayBucket {
    fn new(date: NaiveDate, slices: Vec<IntervalSlice>) -> Self {
        Self {
            date_key: time::date_key(date),
            display_label: time::display_label(date),
            full_label: time::full_label(date),
            slices,
            date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct MonthBucket {
    pub month_key: String,
    pub label: String,
    pub day_buckets: Vec<DayBucket>,
}

fn slice(session: &Session, start: u16, statistical: u16) -> IntervalSlice {
    IntervalSlice {
        activity_type: session.activity_type.clone(),
        start_minute_of_day: start,
        duration_minutes: statistical.max(1).min(MINUTES_PER_DAY - start),
        statistical_minutes: statistical,
        source_session_id: session.id.clone(),
        source: session.source,
    }
}

fn floor_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::minutes(1))
        .unwrap_or(instant)
}

fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> u16 {
    u16::try_from((to - from).num_minutes().max(0)).unwrap_or(u16::MAX)
}

/// Cut one session into per-day slices.
///
/// Statistical minutes are elapsed time clipped to each local day's bounds, so
/// a filled DST day holds 1380 or 1500. Display fields stay on the clock face.
pub fn split_session(
    session: &Session,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    settings: &TimeSettings,
    policy: SpanPolicy,
) -> Vec<(NaiveDate, IntervalSlice)> {
    let (start, end) = (floor_minute(start), floor_minute(end));
    let first = time::wall_clock(start, settings);
    let last = time::local_date(end, settings);
    if first.date == last {
        let minutes = elapsed_minutes(start, end);
        return vec![(first.date, slice(session, first.minute_of_day, minutes))];
    }

    let mut day = first.date + Duration::days(1);
    let mut midnight = time::day_start(day, settings);
    let mut out = vec![(
        first.date,
        slice(session, first.minute_of_day, elapsed_minutes(start, midnight)),
    )];
    while day < last {
        let next = time::day_start(day + Duration::days(1), settings);
        if policy == SpanPolicy::FillIntermediateDays {
            out.push((day, slice(session, 0, elapsed_minutes(midnight, next))));
        }
        day += Duration::days(1);
        midnight = next;
    }
    out.push((last, slice(session, 0, elapsed_minutes(midnight, end))));
    out
}

/// Bucket sessions into local days. Buckets come out ordered by date, slices
/// inside a bucket in input order.
pub fn bucket_days<'a, I>(
    sessions: I,
    settings: &TimeSettings,
    filter: &impl DayFilter,
    policy: SpanPolicy,
) -> Vec<DayBucket>
where
    I: IntoIterator<Item = &'a Session>,
{
    let mut days: BTreeMap<NaiveDate, Vec<IntervalSlice>> = BTreeMap::new();
    for session in sessions {
        let (Some(start), Some(end)) = (session.start, session.end) else {
            continue;
        };
        if end < start {
            tracing::debug!(session = %session.id, "dropping session that ends before it starts");
            continue;
        }
        for (date, piece) in split_session(session, start, end, settings, policy) {
            if filter.includes(date) {
                days.entry(date).or_default().push(piece);
            }
        }
    }
    days.into_iter()
        .map(|(date, slices)| DayBucket::new(date, slices))
        .collect()
}

pub fn bucket_months(day_buckets: Vec<DayBucket>) -> Vec<MonthBucket> {
    let mut months: BTreeMap<YearMonth, Vec<DayBucket>> = BTreeMap::new();
    for bucket in day_buckets {
        months
            .entry(YearMonth::of(bucket.date))
            .or_default()
            .push(bucket);
    }
    months
        .into_iter()
        .map(|(month, mut day_buckets)| {
            day_buckets.sort_by_key(|b| b.date);
            MonthBucket {
                month_key: month.to_string(),
                label: month.label(),
                day_buckets,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::sessions::merge;
    use crate::domains::time::LegacyCorrection;
    use lucinka_client::ActivityRecord;

    fn act(id: i64, start: &str, end: Option<&str>) -> ActivityRecord {
        ActivityRecord {
            id,
            activity_type: "sleeping".into(),
            start_dt: start.into(),
            end_dt: end.map(Into::into),
            notes: None,
        }
    }

    fn buckets_for(acts: &[ActivityRecord], policy: SpanPolicy) -> Vec<DayBucket> {
        let settings = TimeSettings::utc();
        let merged = merge(acts, &[], &[], &settings);
        bucket_days(merged.as_slice(), &settings, &AllDays, policy)
    }

    #[test]
    fn zero_length_session_is_visible_but_counts_nothing() {
        let b = buckets_for(
            &[act(1, "2026-01-12T10:00:00", Some("2026-01-12T10:00:00"))],
            SpanPolicy::default(),
        );
        let s = &b[0].slices[0];
        assert_eq!(s.duration_minutes, 1);
        assert_eq!(s.statistical_minutes, 0);
    }

    #[test]
    fn midnight_crossing_splits_in_two() {
        let b = buckets_for(
            &[act(1, "2026-01-12T23:30:00", Some("2026-01-13T00:15:00"))],
            SpanPolicy::default(),
        );
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].date_key, "2026-01-12");
        assert_eq!(b[0].slices[0].start_minute_of_day, 1410);
        assert_eq!(b[0].slices[0].statistical_minutes, 30);
        assert_eq!(b[1].slices[0].start_minute_of_day, 0);
        assert_eq!(b[1].slices[0].statistical_minutes, 15);
        assert_eq!(b[0].slices[0].source_session_id, b[1].slices[0].source_session_id);
    }

    #[test]
    fn ending_exactly_at_midnight_leaves_a_sliver() {
        let b = buckets_for(
            &[act(1, "2026-01-12T22:00:00", Some("2026-01-13T00:00:00"))],
            SpanPolicy::default(),
        );
        assert_eq!(b[0].slices[0].statistical_minutes, 120);
        assert_eq!(b[1].slices[0].duration_minutes, 1);
        assert_eq!(b[1].slices[0].statistical_minutes, 0);
    }

    #[test]
    fn multi_day_span_fills_or_truncates() {
        let acts = [act(1, "2026-01-10T20:00:00", Some("2026-01-12T02:00:00"))];
        let filled = buckets_for(&acts, SpanPolicy::FillIntermediateDays);
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[1].slices[0].statistical_minutes, 1440);
        assert_eq!(filled[1].slices[0].duration_minutes, 1440);

        let legacy = buckets_for(&acts, SpanPolicy::FirstAndLastOnly);
        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[1].date_key, "2026-01-12");
    }

    fn prague_minutes(start: &str, end: &str) -> Vec<(String, u16, u16)> {
        let settings = TimeSettings::new(chrono_tz::Europe::Prague, LegacyCorrection::none());
        let merged = merge(&[act(1, start, Some(end))], &[], &[], &settings);
        bucket_days(merged.as_slice(), &settings, &AllDays, SpanPolicy::default())
            .into_iter()
            .flat_map(|b| {
                let key = b.date_key.clone();
                b.slices
                    .into_iter()
                    .map(move |s| (key.clone(), s.statistical_minutes, s.duration_minutes))
            })
            .collect()
    }

    #[test]
    fn fall_back_hour_counts_elapsed_time() {
        // 02:40 CEST to 02:10 CET
        let slices = prague_minutes("2026-10-25T00:40:00Z", "2026-10-25T01:10:00Z");
        assert_eq!(slices, vec![("2026-10-25".to_string(), 30, 30)]);
    }

    #[test]
    fn overnight_sleep_across_dst_keeps_its_length() {
        let autumn = prague_minutes("2026-10-24T21:30:00Z", "2026-10-25T06:00:00Z");
        assert_eq!(autumn.iter().map(|s| s.1).collect::<Vec<_>>(), vec![30, 480]);

        let spring = prague_minutes("2026-03-28T22:30:00Z", "2026-03-29T05:00:00Z");
        assert_eq!(spring.iter().map(|s| s.1).collect::<Vec<_>>(), vec![30, 360]);
    }

    #[test]
    fn filled_25h_day_counts_1500_but_draws_1440() {
        let slices = prague_minutes("2026-10-24T12:00:00Z", "2026-10-26T12:00:00Z");
        assert_eq!(slices[1], ("2026-10-25".to_string(), 1500, 1440));
        let total: u32 = slices.iter().map(|s| u32::from(s.1)).sum();
        assert_eq!(total, 48 * 60);
    }

    #[test]
    fn open_and_inverted_sessions_are_skipped() {
        let b = buckets_for(
            &[
                act(1, "2026-01-12T08:00:00", None),
                act(2, "2026-01-12T09:00:00", Some("2026-01-12T08:00:00")),
                act(3, "bad", Some("2026-01-12T08:00:00")),
            ],
            SpanPolicy::default(),
        );
        assert!(b.is_empty());
    }

    #[test]
    fn filter_applies_per_slice_day() {
        let settings = TimeSettings::utc();
        let merged = merge(
            &[act(1, "2025-12-31T23:00:00", Some("2026-01-01T01:00:00"))],
            &[],
            &[],
            &settings,
        );
        let jan = MonthFilter::Month("2026-01".parse().unwrap());
        let b = bucket_days(merged.as_slice(), &settings, &jan, SpanPolicy::default());
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].date_key, "2026-01-01");
        assert_eq!(b[0].slices[0].statistical_minutes, 60);
    }

    #[test]
    fn overlapping_sessions_keep_separate_slices_in_merge_order() {
        let b = buckets_for(
            &[
                act(2, "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")),
                act(1, "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")),
            ],
            SpanPolicy::default(),
        );
        let ids: Vec<_> = b[0].slices.iter().map(|s| s.source_session_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn months_group_days_in_order() {
        let b = buckets_for(
            &[
                act(1, "2026-01-02T10:00:00", Some("2026-01-02T11:00:00")),
                act(2, "2025-12-30T10:00:00", Some("2025-12-30T11:00:00")),
                act(3, "2026-01-01T10:00:00", Some("2026-01-01T11:00:00")),
            ],
            SpanPolicy::default(),
        );
        let months = bucket_months(b);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month_key, "2025-12");
        let jan: Vec<_> = months[1].day_buckets.iter().map(|d| d.date_key.as_str()).collect();
        assert_eq!(jan, vec!["2026-01-01", "2026-01-02"]);
    }

    #[test]
    fn viewer_filter_for_admin_shows_everything() {
        let m: YearMonth = "2026-01".parse().unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(MonthFilter::for_viewer(true, m).includes(d));
        assert!(!MonthFilter::for_viewer(false, m).includes(d));
        let closure = |date: NaiveDate| date == d;
        assert!(closure.includes(d));
    }
}
