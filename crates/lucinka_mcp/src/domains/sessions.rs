//! Session merging: activities, feedings and visits as one uniform stream.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lucinka_client::{ActivityRecord, BreastfeedingRecord, VisitRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::buckets::DayFilter;
use super::time::{self, TimeSettings, YearMonth};

pub const EATING_TYPE: &str = "eating";
pub const VISIT_TYPE: &str = "visit";

const VISIT_LENGTH_MINUTES: i64 = 60;

/// Where a session came from. Drives deletability and id prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    Activity,
    Breastfeeding,
    Visit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionDetails {
    Activity {
        notes: Option<String>,
    },
    Feeding {
        left_minutes: Option<f64>,
        right_minutes: Option<f64>,
    },
    Visit {
        doctor: String,
        location: String,
        visit_type: String,
        notes: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    pub record_id: i64,
    pub source: SessionSource,
    pub activity_type: String,
    /// Corrected start instant; `None` when the raw value did not parse.
    pub start: Option<DateTime<Utc>>,
    /// Corrected end instant; `None` while in progress or when unparseable.
    pub end: Option<DateTime<Utc>>,
    pub end_recorded: bool,
    pub details: SessionDetails,
}

impl Session {
    pub fn is_deletable(&self) -> bool {
        match self.source {
            SessionSource::Activity => true,
            SessionSource::Breastfeeding | SessionSource::Visit => false,
        }
    }

    /// Started but not yet finished.
    pub fn is_ongoing(&self) -> bool {
        match self.source {
            SessionSource::Activity => !self.end_recorded,
            SessionSource::Breastfeeding | SessionSource::Visit => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if e >= s)
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if e >= s => Some((e - s).num_minutes()),
            _ => None,
        }
    }

    pub fn view(&self, settings: &TimeSettings) -> SessionView {
        let (notes, left, right, doctor, location) = match &self.details {
            SessionDetails::Activity { notes } => (notes.clone(), None, None, None, None),
            SessionDetails::Feeding {
                left_minutes,
                right_minutes,
            } => (None, *left_minutes, *right_minutes, None, None),
            SessionDetails::Visit {
                doctor,
                location,
                notes,
                ..
            } => (
                notes.clone(),
                None,
                None,
                Some(doctor.clone()),
                Some(location.clone()),
            ),
        };
        SessionView {
            id: self.id.clone(),
            source: self.source,
            activity_type: self.activity_type.clone(),
            start: self.start.map(|s| time::format_local(s, settings)),
            end: self.end.map(|e| time::format_local(e, settings)),
            duration_minutes: self.duration_minutes(),
            ongoing: self.is_ongoing(),
            deletable: self.is_deletable(),
            notes,
            left_minutes: left,
            right_minutes: right,
            doctor,
            location,
        }
    }
}

#[derive(Clone, Debug, Serialize, JsonSchema)]
pub struct SessionView {
    pub id: String,
    pub source: SessionSource,
    pub activity_type: String,
    /// Local start time (RFC3339); absent for malformed records.
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration_minutes: Option<i64>,
    pub ongoing: bool,
    pub deletable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

fn from_activity(rec: &ActivityRecord, settings: &TimeSettings) -> Session {
    let end_recorded = rec.end_dt.as_deref().is_some_and(|s| !s.trim().is_empty());
    Session {
        id: rec.id.to_string(),
        record_id: rec.id,
        source: SessionSource::Activity,
        activity_type: rec.activity_type.clone(),
        start: time::parse_instant(&rec.start_dt, settings),
        end: rec
            .end_dt
            .as_deref()
            .and_then(|raw| time::parse_instant(raw, settings)),
        end_recorded,
        details: SessionDetails::Activity {
            notes: rec.notes.clone(),
        },
    }
}

fn from_feeding(rec: &BreastfeedingRecord, settings: &TimeSettings) -> Session {
    Session {
        id: format!("{EATING_TYPE}-{}", rec.id),
        record_id: rec.id,
        source: SessionSource::Breastfeeding,
        activity_type: EATING_TYPE.to_string(),
        start: time::parse_instant(&rec.start_dt, settings),
        end: time::parse_instant(&rec.end_dt, settings),
        end_recorded: true,
        details: SessionDetails::Feeding {
            left_minutes: rec.left_duration,
            right_minutes: rec.right_duration,
        },
    }
}

fn from_visit(rec: &VisitRecord, settings: &TimeSettings) -> Session {
    let start = time::parse_instant(&rec.date, settings);
    Session {
        id: format!("{VISIT_TYPE}-{}", rec.id),
        record_id: rec.id,
        source: SessionSource::Visit,
        activity_type: VISIT_TYPE.to_string(),
        start,
        end: start.map(|s| s + Duration::minutes(VISIT_LENGTH_MINUTES)),
        end_recorded: true,
        details: SessionDetails::Visit {
            doctor: rec.doctor.clone(),
            location: rec.location.clone(),
            visit_type: rec.visit_type.clone(),
            notes: rec.notes.clone(),
        },
    }
}

/// Combine the three collections. Pumped feedings are not sessions of the
/// baby and are left out; nothing is deduplicated.
pub fn merge(
    activities: &[ActivityRecord],
    breastfeeding: &[BreastfeedingRecord],
    visits: &[VisitRecord],
    settings: &TimeSettings,
) -> MergedSessions {
    let sessions = activities
        .iter()
        .map(|a| from_activity(a, settings))
        .chain(
            breastfeeding
                .iter()
                .filter(|b| !b.is_pumped)
                .map(|b| from_feeding(b, settings)),
        )
        .chain(visits.iter().map(|v| from_visit(v, settings)))
        .collect();
    MergedSessions { sessions }
}

/// Invalid starts sort after every valid one in either direction.
fn compare_starts(a: &Session, b: &Session, newest_first: bool) -> Ordering {
    match (a.start, b.start) {
        (Some(x), Some(y)) if newest_first => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Clone, Debug)]
pub struct StartDayGroup<'a> {
    pub date: NaiveDate,
    pub sessions: Vec<&'a Session>,
}

#[derive(Clone, Debug, Default)]
pub struct MergedSessions {
    sessions: Vec<Session>,
}

impl MergedSessions {
    /// Sessions in merge order.
    pub fn as_slice(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn newest_first(&self) -> Vec<&Session> {
        let mut out: Vec<&Session> = self.sessions.iter().collect();
        out.sort_by(|a, b| compare_starts(a, b, true));
        out
    }

    pub fn oldest_first(&self) -> Vec<&Session> {
        let mut out: Vec<&Session> = self.sessions.iter().collect();
        out.sort_by(|a, b| compare_starts(a, b, false));
        out
    }

    pub fn ongoing(&self) -> Vec<&Session> {
        self.sessions.iter().filter(|s| s.is_ongoing()).collect()
    }

    /// Months holding at least one completed session, newest first.
    pub fn available_months(&self, settings: &TimeSettings) -> Vec<YearMonth> {
        let mut months: Vec<YearMonth> = self
            .sessions
            .iter()
            .filter(|s| s.is_completed())
            .filter_map(|s| s.start)
            .map(|start| YearMonth::of(time::local_date(start, settings)))
            .collect();
        months.sort_unstable_by(|a, b| b.cmp(a));
        months.dedup();
        months
    }

    /// Unsplit sessions grouped by local start day, newest day first.
    pub fn group_by_start_day(
        &self,
        settings: &TimeSettings,
        filter: &impl DayFilter,
    ) -> Vec<StartDayGroup<'_>> {
        let mut days: BTreeMap<NaiveDate, Vec<&Session>> = BTreeMap::new();
        for session in self.newest_first() {
            let Some(start) = session.start else {
                continue;
            };
            let date = time::local_date(start, settings);
            if filter.includes(date) {
                days.entry(date).or_default().push(session);
            }
        }
        days.into_iter()
            .rev()
            .map(|(date, sessions)| StartDayGroup { date, sessions })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::buckets::{AllDays, MonthFilter};

    fn activity(id: i64, ty: &str, start: &str, end: Option<&str>) -> ActivityRecord {
        ActivityRecord {
            id,
            activity_type: ty.into(),
            start_dt: start.into(),
            end_dt: end.map(Into::into),
            notes: None,
        }
    }

    fn feeding(id: i64, start: &str, end: &str, pumped: bool) -> BreastfeedingRecord {
        BreastfeedingRecord {
            id,
            start_dt: start.into(),
            end_dt: end.into(),
            left_duration: Some(10.0),
            right_duration: Some(5.0),
            is_pumped: pumped,
            is_breast: !pumped,
            ml_amount: None,
        }
    }

    fn visit(id: i64, date: &str) -> VisitRecord {
        VisitRecord {
            id,
            date: date.into(),
            doctor: "Dr. Novak".into(),
            location: "Brno".into(),
            visit_type: "checkup".into(),
            notes: None,
        }
    }

    #[test]
    fn activities_alone_pass_through() {
        let acts: Vec<_> = (1..=4)
            .map(|i| activity(i, "walking", "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")))
            .collect();
        let merged = merge(&acts, &[], &[], &TimeSettings::utc());
        assert_eq!(merged.len(), 4);
        assert!(merged.as_slice().iter().all(|s| s.source == SessionSource::Activity));
    }

    #[test]
    fn feedings_become_eating_and_pumped_are_dropped() {
        let feeds = vec![
            feeding(5, "2026-01-12T06:00:00", "2026-01-12T06:15:00", false),
            feeding(6, "2026-01-12T09:00:00", "2026-01-12T09:10:00", true),
        ];
        let merged = merge(&[], &feeds, &[], &TimeSettings::utc());
        assert_eq!(merged.len(), 1);
        let s = &merged.as_slice()[0];
        assert_eq!(s.id, "eating-5");
        assert_eq!(s.activity_type, EATING_TYPE);
        assert!(!s.is_deletable());
    }

    #[test]
    fn visits_last_one_hour() {
        let merged = merge(&[], &[], &[visit(3, "2026-01-20T09:30:00")], &TimeSettings::utc());
        let s = &merged.as_slice()[0];
        assert_eq!(s.id, "visit-3");
        assert_eq!(s.duration_minutes(), Some(60));
        assert!(!s.is_deletable());
    }

    #[test]
    fn sorting_puts_invalid_starts_last() {
        let acts = vec![
            activity(1, "walking", "garbage", None),
            activity(2, "walking", "2026-01-10T10:00:00", Some("2026-01-10T11:00:00")),
            activity(3, "walking", "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")),
        ];
        let merged = merge(&acts, &[], &[], &TimeSettings::utc());
        let newest: Vec<_> = merged.newest_first().iter().map(|s| s.record_id).collect();
        assert_eq!(newest, vec![3, 2, 1]);
        let oldest: Vec<_> = merged.oldest_first().iter().map(|s| s.record_id).collect();
        assert_eq!(oldest, vec![2, 3, 1]);
        // Merge order is untouched.
        assert_eq!(merged.as_slice()[0].record_id, 1);
    }

    #[test]
    fn ongoing_only_for_open_activities() {
        let acts = vec![
            activity(1, "sleeping", "2026-01-12T08:00:00", None),
            activity(2, "walking", "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")),
        ];
        let merged = merge(&acts, &[], &[], &TimeSettings::utc());
        let ongoing = merged.ongoing();
        assert_eq!(ongoing.len(), 1);
        assert_eq!(ongoing[0].record_id, 1);
    }

    #[test]
    fn available_months_newest_first_from_completed() {
        let acts = vec![
            activity(1, "walking", "2025-11-03T10:00:00", Some("2025-11-03T11:00:00")),
            activity(2, "walking", "2026-01-12T10:00:00", Some("2026-01-12T11:00:00")),
            activity(3, "walking", "2025-12-24T10:00:00", None),
            activity(4, "walking", "2025-11-20T10:00:00", Some("2025-11-20T11:00:00")),
        ];
        let merged = merge(&acts, &[], &[], &TimeSettings::utc());
        let months: Vec<String> = merged
            .available_months(&TimeSettings::utc())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, vec!["2026-01", "2025-11"]);
    }

    #[test]
    fn group_by_start_day_respects_filter() {
        let acts = vec![
            activity(1, "walking", "2025-12-31T10:00:00", Some("2025-12-31T11:00:00")),
            activity(2, "walking", "2026-01-02T10:00:00", Some("2026-01-02T11:00:00")),
            activity(3, "sleeping", "2026-01-02T20:00:00", Some("2026-01-03T06:00:00")),
        ];
        let settings = TimeSettings::utc();
        let merged = merge(&acts, &[], &[], &settings);

        let all = merged.group_by_start_day(&settings, &AllDays);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(all[0].sessions[0].record_id, 3);

        let jan = MonthFilter::Month("2026-01".parse().unwrap());
        let only_jan = merged.group_by_start_day(&settings, &jan);
        assert_eq!(only_jan.len(), 1);
    }

    #[test]
    fn view_carries_provenance() {
        let merged = merge(
            &[],
            &[feeding(5, "2026-01-12T06:00:00", "2026-01-12T06:15:00", false)],
            &[],
            &TimeSettings::utc(),
        );
        let view = merged.as_slice()[0].view(&TimeSettings::utc());
        assert_eq!(view.source, SessionSource::Breastfeeding);
        assert_eq!(view.duration_minutes, Some(15));
        assert_eq!(view.left_minutes, Some(10.0));
        assert!(!view.deletable);
    }
}
