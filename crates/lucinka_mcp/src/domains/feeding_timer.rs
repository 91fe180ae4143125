//! Two-sided feeding stopwatch.
//!
//! Pure state; the one-second ticks come from [`crate::services::FeedingTimerService`].

use chrono::{DateTime, Utc};
use lucinka_client::NewBreastfeeding;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::time::{self, TimeSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedingTimer {
    started_at: Option<DateTime<Utc>>,
    active: Option<Side>,
    paused: bool,
    left_seconds: u64,
    right_seconds: u64,
}

impl FeedingTimer {
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_counting(&self) -> bool {
        self.is_running() && !self.paused && self.active.is_some()
    }

    /// Start on `side`, or move to it if already running. The session start
    /// time is kept from the first call.
    pub fn start(&mut self, side: Side, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.active = Some(side);
        self.paused = false;
    }

    pub fn tick(&mut self) {
        if !self.is_counting() {
            return;
        }
        match self.active {
            Some(Side::Left) => self.left_seconds += 1,
            Some(Side::Right) => self.right_seconds += 1,
            None => {}
        }
    }

    /// Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_running() {
            self.paused = !self.paused;
        }
        self.paused
    }

    pub fn switch_side(&mut self) -> Option<Side> {
        self.active = self.active.map(Side::other);
        self.active
    }

    /// Pause and produce the session to save. `None` when nothing has been
    /// timed yet; the timer keeps its state until [`reset`](Self::reset).
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<NewBreastfeeding> {
        self.paused = true;
        let started = self.started_at?;
        if self.left_seconds == 0 && self.right_seconds == 0 {
            return None;
        }
        Some(NewBreastfeeding::new(
            started,
            now,
            (self.left_seconds / 60) as f64,
            (self.right_seconds / 60) as f64,
        ))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn status(&self, settings: &TimeSettings) -> TimerStatus {
        TimerStatus {
            running: self.is_running(),
            paused: self.paused,
            active_side: self.active,
            started_at: self.started_at.map(|s| time::format_local(s, settings)),
            left_seconds: self.left_seconds,
            right_seconds: self.right_seconds,
            left_clock: format_clock(self.left_seconds),
            right_clock: format_clock(self.right_seconds),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TimerStatus {
    pub running: bool,
    pub paused: bool,
    pub active_side: Option<Side>,
    pub started_at: Option<String>,
    pub left_seconds: u64,
    pub right_seconds: u64,
    /// `mm:ss`
    pub left_clock: String,
    pub right_clock: String,
}

pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 12, 6, 0, 0).unwrap()
    }

    #[test]
    fn ticks_accumulate_on_active_side_only() {
        let mut timer = FeedingTimer::default();
        timer.tick();
        assert_eq!(timer.status(&TimeSettings::utc()).left_seconds, 0);

        timer.start(Side::Left, t0());
        for _ in 0..90 {
            timer.tick();
        }
        timer.switch_side();
        for _ in 0..30 {
            timer.tick();
        }
        let st = timer.status(&TimeSettings::utc());
        assert_eq!((st.left_seconds, st.right_seconds), (90, 30));
        assert_eq!(st.left_clock, "01:30");
        assert_eq!(st.active_side, Some(Side::Right));
    }

    #[test]
    fn paused_timer_does_not_count() {
        let mut timer = FeedingTimer::default();
        timer.start(Side::Right, t0());
        assert!(timer.toggle_pause());
        timer.tick();
        assert!(!timer.toggle_pause());
        timer.tick();
        assert_eq!(timer.status(&TimeSettings::utc()).right_seconds, 1);
    }

    #[test]
    fn restarting_keeps_original_start() {
        let mut timer = FeedingTimer::default();
        timer.start(Side::Left, t0());
        timer.start(Side::Right, t0() + Duration::minutes(5));
        let st = timer.status(&TimeSettings::utc());
        assert_eq!(st.started_at.as_deref(), Some("2026-01-12T06:00:00+00:00"));
    }

    #[test]
    fn finish_floors_to_minutes() {
        let mut timer = FeedingTimer::default();
        timer.start(Side::Left, t0());
        for _ in 0..659 {
            timer.tick();
        }
        timer.switch_side();
        for _ in 0..61 {
            timer.tick();
        }
        let session = timer.finish(t0() + Duration::minutes(12)).unwrap();
        assert_eq!(session.left_duration, 10.0);
        assert_eq!(session.right_duration, 1.0);
        assert_eq!(session.start_dt, "2026-01-12T06:00:00.000Z");
        assert_eq!(session.end_dt, "2026-01-12T06:12:00.000Z");
        // Still held until the save succeeds.
        assert!(timer.is_running());
        timer.reset();
        assert!(!timer.is_running());
    }

    #[test]
    fn finish_without_time_yields_nothing() {
        let mut timer = FeedingTimer::default();
        assert!(timer.finish(t0()).is_none());
        timer.start(Side::Left, t0());
        assert!(timer.finish(t0()).is_none());
        assert!(timer.status(&TimeSettings::utc()).paused);
    }
}
