//! Time normalization: raw API timestamps to local wall-clock positions.
//!
//! Every downstream module works on [`WallClock`] values produced here, so the
//! timezone and the legacy-offset rule are applied in exactly one place.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use lucinka_client::utils::parse_api_timestamp;
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: u16 = 1440;

/// Records written before the server-side timezone migration were stored one
/// hour early. Instants strictly before `cutover` are shifted by `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyCorrection {
    cutover: Option<DateTime<Utc>>,
    offset: Duration,
}

impl LegacyCorrection {
    pub fn new(cutover: DateTime<Utc>, offset: Duration) -> Self {
        Self {
            cutover: Some(cutover),
            offset,
        }
    }

    pub fn none() -> Self {
        Self {
            cutover: None,
            offset: Duration::zero(),
        }
    }

    pub fn cutover(&self) -> Option<DateTime<Utc>> {
        self.cutover
    }

    pub fn apply(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        match self.cutover {
            Some(cutover) if instant < cutover => instant + self.offset,
            _ => instant,
        }
    }
}

impl Default for LegacyCorrection {
    fn default() -> Self {
        let cutover = Utc
            .with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(cutover, Duration::hours(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSettings {
    pub timezone: Tz,
    pub legacy: LegacyCorrection,
}

impl TimeSettings {
    pub fn new(timezone: Tz, legacy: LegacyCorrection) -> Self {
        Self { timezone, legacy }
    }

    /// UTC settings without correction; handy when inputs are already exact.
    pub fn utc() -> Self {
        Self::new(chrono_tz::UTC, LegacyCorrection::none())
    }
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Prague, LegacyCorrection::default())
    }
}

/// A position on the local 24h clock face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallClock {
    pub date: NaiveDate,
    pub minute_of_day: u16,
}

/// Parse a raw timestamp and apply the legacy correction. `None` is the
/// invalid-date sentinel.
pub fn parse_instant(raw: &str, settings: &TimeSettings) -> Option<DateTime<Utc>> {
    parse_api_timestamp(raw).map(|dt| settings.legacy.apply(dt))
}

pub fn to_local(instant: DateTime<Utc>, settings: &TimeSettings) -> DateTime<Tz> {
    instant.with_timezone(&settings.timezone)
}

pub fn wall_clock(instant: DateTime<Utc>, settings: &TimeSettings) -> WallClock {
    let local = to_local(instant, settings);
    WallClock {
        date: local.date_naive(),
        minute_of_day: (local.hour() * 60 + local.minute()) as u16,
    }
}

pub fn normalize(raw: &str, settings: &TimeSettings) -> Option<WallClock> {
    parse_instant(raw, settings).map(|dt| wall_clock(dt, settings))
}

pub fn local_date(instant: DateTime<Utc>, settings: &TimeSettings) -> NaiveDate {
    to_local(instant, settings).date_naive()
}

/// The instant a local day begins. Zones that skip midnight start the day at
/// the first wall time after the gap.
pub fn day_start(date: NaiveDate, settings: &TimeSettings) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hour| local_to_utc(midnight + Duration::hours(hour), settings))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Interpret a local wall time as an instant. Ambiguous times (DST fold)
/// resolve to the earlier one; times inside a DST gap are rejected.
pub fn local_to_utc(naive: NaiveDateTime, settings: &TimeSettings) -> Option<DateTime<Utc>> {
    settings
        .timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse `YYYY-MM-DD` and `HH:MM` entered by hand as local time.
pub fn parse_local_date_time(date: &str, time: &str, settings: &TimeSettings) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    local_to_utc(date.and_time(time), settings)
}

/// Parse a `datetime-local` style value (`YYYY-MM-DDTHH:MM`) as local time.
/// Values carrying an explicit offset are taken as-is.
pub fn parse_local_datetime(raw: &str, settings: &TimeSettings) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| local_to_utc(naive, settings))
}

/// Local midnight of the Sunday starting the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday();
    date - Duration::days(i64::from(back))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Short label shown on chart rows, e.g. `Mon, Jan 12`.
pub fn display_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// Long label shown in tooltips, e.g. `Monday, January 12, 2026`.
pub fn full_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn format_local(instant: DateTime<Utc>, settings: &TimeSettings) -> String {
    to_local(instant, settings).to_rfc3339()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.pred_opt())
    }

    /// Long label, e.g. `January 2026`.
    pub fn label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a month as YYYY-MM, got {0:?}")]
pub struct YearMonthParseError(pub String);

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || YearMonthParseError(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(err)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(err());
        }
        let year = y.parse::<i32>().map_err(|_| err())?;
        let month = m.parse::<u32>().map_err(|_| err())?;
        YearMonth::new(year, month).ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn day_start_follows_dst_and_skipped_midnights() {
        let prague = TimeSettings::new(chrono_tz::Europe::Prague, LegacyCorrection::none());
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(day_start(d(2026, 3, 29), &prague), utc(2026, 3, 28, 23, 0));
        assert_eq!(day_start(d(2026, 3, 30), &prague), utc(2026, 3, 29, 22, 0));

        // 2018-11-04 had no local midnight in Sao Paulo
        let sao_paulo = TimeSettings::new(chrono_tz::America::Sao_Paulo, LegacyCorrection::none());
        assert_eq!(day_start(d(2018, 11, 4), &sao_paulo), utc(2018, 11, 4, 3, 0));
    }

    #[test]
    fn legacy_shift_applies_only_before_cutover() {
        let legacy = LegacyCorrection::default();
        assert_eq!(legacy.apply(utc(2026, 1, 4, 23, 0)), utc(2026, 1, 5, 0, 0));
        assert_eq!(legacy.apply(utc(2026, 1, 5, 0, 0)), utc(2026, 1, 5, 0, 0));
        assert_eq!(LegacyCorrection::none().apply(utc(2025, 1, 1, 0, 0)), utc(2025, 1, 1, 0, 0));
    }

    #[test]
    fn normalize_converts_to_local_wall_clock() {
        let settings = TimeSettings::new(chrono_tz::Europe::Prague, LegacyCorrection::none());
        // CET is UTC+1 in January.
        let wc = normalize("2026-01-12T22:30:00Z", &settings).unwrap();
        assert_eq!(wc.date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(wc.minute_of_day, 23 * 60 + 30);
    }

    #[test]
    fn normalize_applies_legacy_then_zone() {
        let settings = TimeSettings::default();
        // 22:30Z before cutover -> 23:30Z -> 00:30 CET next day.
        let wc = normalize("2025-12-01T22:30:00", &settings).unwrap();
        assert_eq!(wc.date, NaiveDate::from_ymd_opt(2025, 12, 2).unwrap());
        assert_eq!(wc.minute_of_day, 30);
    }

    #[test]
    fn malformed_input_is_sentinel() {
        let settings = TimeSettings::default();
        assert!(normalize("Invalid Date", &settings).is_none());
        assert!(normalize("", &settings).is_none());
    }

    #[test]
    fn minute_of_day_stays_in_range() {
        let settings = TimeSettings::utc();
        let wc = normalize("2026-02-01T23:59:59", &settings).unwrap();
        assert_eq!(wc.minute_of_day, 1439);
    }

    #[test]
    fn local_entry_round_trips_through_zone() {
        let settings = TimeSettings::default();
        let dt = parse_local_date_time("2026-01-12", "08:15", &settings).unwrap();
        assert_eq!(dt, utc(2026, 1, 12, 7, 15));
        assert!(parse_local_date_time("2026-01-12", "", &settings).is_none());
        let dt = parse_local_datetime("2026-07-01T10:00", &settings).unwrap();
        assert_eq!(dt, utc(2026, 7, 1, 8, 0));
    }

    #[test]
    fn dst_gap_is_rejected() {
        let settings = TimeSettings::default();
        assert!(parse_local_date_time("2026-03-29", "02:30", &settings).is_none());
    }

    #[test]
    fn week_starts_on_sunday() {
        let wed = NaiveDate::from_ymd_opt(2026, 1, 14).unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2026, 1, 11).unwrap());
        let sun = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
        assert_eq!(week_start(sun), sun);
    }

    #[test]
    fn year_month_parses_and_bounds() {
        let ym: YearMonth = "2025-12".parse().unwrap();
        assert_eq!(ym.to_string(), "2025-12");
        assert_eq!(ym.last_day(), NaiveDate::from_ymd_opt(2025, 12, 31));
        let feb: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("25-01".parse::<YearMonth>().is_err());
        assert_eq!(ym.label(), "December 2025");
    }

    #[test]
    fn labels_render() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        assert_eq!(display_label(d), "Mon, Jan 12");
        assert_eq!(full_label(d), "Monday, January 12, 2026");
        assert_eq!(date_key(d), "2026-01-12");
    }
}
