//! Per-type statistics over day buckets for today, this week and a month.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::activity_types::ActivityTypeRegistry;
use super::buckets::DayBucket;
use super::sessions::SessionSource;
use super::time::{self, TimeSettings, YearMonth};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatisticsWindow {
    Today,
    /// Sunday 00:00 local up to now.
    ThisWeek,
    Month(YearMonth),
}

/// Inclusive range of local dates. Rolling windows also stop at "now": on
/// `last`, slices starting after `until_minute` are left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub until_minute: Option<u16>,
}

impl DateRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            first,
            last,
            until_minute: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    fn admits(&self, date: NaiveDate, start_minute: u16) -> bool {
        match self.until_minute {
            Some(until) if date == self.last => start_minute <= until,
            _ => true,
        }
    }
}

impl StatisticsWindow {
    pub fn range(&self, now: DateTime<Utc>, settings: &TimeSettings) -> Option<DateRange> {
        let now = time::wall_clock(now, settings);
        let up_to_now = |first| DateRange {
            until_minute: Some(now.minute_of_day),
            ..DateRange::new(first, now.date)
        };
        match self {
            StatisticsWindow::Today => Some(up_to_now(now.date)),
            StatisticsWindow::ThisWeek => Some(up_to_now(time::week_start(now.date))),
            StatisticsWindow::Month(m) => Some(DateRange::new(m.first_day()?, m.last_day()?)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatisticsOptions {
    pub include_visits: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TypeStatistic {
    pub activity_type: String,
    /// Distinct sessions; a session split at midnight counts once.
    pub count: u32,
    pub total_duration_minutes: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct WindowStatistics {
    pub total_activities: u32,
    pub total_duration_minutes: u32,
    pub by_type: Vec<TypeStatistic>,
}

impl WindowStatistics {
    pub fn for_type(&self, key: &str) -> Option<&TypeStatistic> {
        self.by_type.iter().find(|t| t.activity_type == key)
    }
}

/// Aggregate the slices of buckets within `range`.
pub fn aggregate(
    buckets: &[DayBucket],
    range: DateRange,
    options: &StatisticsOptions,
) -> WindowStatistics {
    let mut per_type: BTreeMap<&str, (BTreeSet<&str>, u32)> = BTreeMap::new();
    for bucket in buckets.iter().filter(|b| range.contains(b.date)) {
        for slice in &bucket.slices {
            if slice.source == SessionSource::Visit && !options.include_visits {
                continue;
            }
            if !range.admits(bucket.date, slice.start_minute_of_day) {
                continue;
            }
            let entry = per_type.entry(slice.activity_type.as_str()).or_default();
            entry.0.insert(slice.source_session_id.as_str());
            entry.1 += u32::from(slice.statistical_minutes);
        }
    }

    let by_type: Vec<TypeStatistic> = per_type
        .into_iter()
        .map(|(ty, (sessions, minutes))| TypeStatistic {
            activity_type: ty.to_string(),
            count: sessions.len() as u32,
            total_duration_minutes: minutes,
        })
        .collect();
    WindowStatistics {
        total_activities: by_type.iter().map(|t| t.count).sum(),
        total_duration_minutes: by_type.iter().map(|t| t.total_duration_minutes).sum(),
        by_type,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct ComparisonRow {
    pub activity_type: String,
    pub label: String,
    pub today: TypeStatistic,
    pub this_week: TypeStatistic,
    pub month: TypeStatistic,
}

fn stat_or_zero(stats: &WindowStatistics, key: &str) -> TypeStatistic {
    stats.for_type(key).cloned().unwrap_or_else(|| TypeStatistic {
        activity_type: key.to_string(),
        ..TypeStatistic::default()
    })
}

/// Rows for the today/week/month table. Types with nothing in any window are
/// left out; unregistered types seen in the data are appended.
pub fn comparison_table(
    today: &WindowStatistics,
    week: &WindowStatistics,
    month: &WindowStatistics,
    registry: &ActivityTypeRegistry,
) -> Vec<ComparisonRow> {
    let mut keys: Vec<String> = registry.iter().map(|t| t.definition.key.clone()).collect();
    for stats in [today, week, month] {
        for t in &stats.by_type {
            if !keys.contains(&t.activity_type) {
                keys.push(t.activity_type.clone());
            }
        }
    }
    keys.into_iter()
        .filter_map(|key| {
            let row = ComparisonRow {
                label: registry.label(&key),
                today: stat_or_zero(today, &key),
                this_week: stat_or_zero(week, &key),
                month: stat_or_zero(month, &key),
                activity_type: key,
            };
            let empty = [&row.today, &row.this_week, &row.month]
                .iter()
                .all(|s| s.count == 0 && s.total_duration_minutes == 0);
            (!empty).then_some(row)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct LegendEntry {
    pub key: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    pub count: u32,
}

/// One entry per registered type, zero counts included.
pub fn legend(month: &WindowStatistics, registry: &ActivityTypeRegistry) -> Vec<LegendEntry> {
    registry
        .iter()
        .map(|t| LegendEntry {
            key: t.definition.key.clone(),
            label: t.definition.label.clone(),
            color: t.definition.color.clone(),
            icon: t.definition.icon.clone(),
            count: month.for_type(&t.definition.key).map_or(0, |s| s.count),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct PeriodSummary {
    pub total_activities: u32,
    pub total_hours: f64,
    /// Days with at least one counted slice.
    pub days: u32,
    pub average_per_day: f64,
}

fn one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Header cards of the timeline: totals over the buckets shown.
pub fn period_summary(
    buckets: &[DayBucket],
    options: &StatisticsOptions,
) -> PeriodSummary {
    let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
        return PeriodSummary {
            total_activities: 0,
            total_hours: 0.0,
            days: 0,
            average_per_day: 0.0,
        };
    };
    let stats = aggregate(
        buckets,
        DateRange::new(first.date.min(last.date), first.date.max(last.date)),
        options,
    );
    let days = buckets
        .iter()
        .filter(|b| {
            b.slices
                .iter()
                .any(|s| options.include_visits || s.source != SessionSource::Visit)
        })
        .count() as u32;
    PeriodSummary {
        total_activities: stats.total_activities,
        total_hours: one_decimal(f64::from(stats.total_duration_minutes) / 60.0),
        days,
        average_per_day: if days == 0 {
            0.0
        } else {
            one_decimal(f64::from(stats.total_activities) / f64::from(days))
        },
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct StatisticsReport {
    pub month_key: String,
    pub today: WindowStatistics,
    pub this_week: WindowStatistics,
    pub month: WindowStatistics,
    pub comparison: Vec<ComparisonRow>,
    pub legend: Vec<LegendEntry>,
}

/// All three windows plus the derived table and legend. `buckets` must be
/// built without a month filter.
pub fn report(
    buckets: &[DayBucket],
    now: DateTime<Utc>,
    month: YearMonth,
    registry: &ActivityTypeRegistry,
    options: &StatisticsOptions,
    settings: &TimeSettings,
) -> StatisticsReport {
    let window = |w: StatisticsWindow| {
        w.range(now, settings)
            .map(|r| aggregate(buckets, r, options))
            .unwrap_or_default()
    };
    let today = window(StatisticsWindow::Today);
    let this_week = window(StatisticsWindow::ThisWeek);
    let month_stats = window(StatisticsWindow::Month(month));
    StatisticsReport {
        month_key: month.to_string(),
        comparison: comparison_table(&today, &this_week, &month_stats, registry),
        legend: legend(&month_stats, registry),
        today,
        this_week,
        month: month_stats,
    }
}
