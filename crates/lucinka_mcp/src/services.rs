use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

use lucinka_client::{
    ActivityRecord, BreastfeedingRecord, CurrentUser, DataEntry, LucinkaClient, NewBreastfeeding,
    VisitRecord,
};

use crate::domains::feeding_timer::{FeedingTimer, Side, TimerStatus};
use crate::domains::sessions::{self, MergedSessions};
use crate::domains::time::TimeSettings;
use crate::error::{McpError, McpResult};

/// Everything one view needs, fetched in a single round.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub user: CurrentUser,
    pub activities: Vec<ActivityRecord>,
    pub breastfeeding: Vec<BreastfeedingRecord>,
    pub visits: Vec<VisitRecord>,
    pub data: Vec<DataEntry>,
}

impl Snapshot {
    pub fn sessions(&self, settings: &TimeSettings) -> MergedSessions {
        sessions::merge(&self.activities, &self.breastfeeding, &self.visits, settings)
    }
}

#[derive(Clone)]
pub struct SnapshotService {
    client: Arc<dyn LucinkaClient>,
}

impl SnapshotService {
    pub fn new(client: Arc<dyn LucinkaClient>) -> Self {
        Self { client }
    }

    /// Fetch the user and all collections concurrently. Any failure voids the
    /// whole snapshot; nothing is retried.
    pub async fn load(&self) -> McpResult<Snapshot> {
        let client = &self.client;
        let (user, activities, breastfeeding, visits, data) = tokio::try_join!(
            client.get_current_user(),
            client.get_activities(),
            client.get_breastfeeding(),
            client.get_visits(),
            client.get_data(),
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "snapshot fetch failed");
            McpError::SessionInvalid(e.to_string())
        })?;
        tracing::debug!(
            activities = activities.len(),
            breastfeeding = breastfeeding.len(),
            visits = visits.len(),
            data = data.len(),
            "snapshot loaded"
        );
        Ok(Snapshot {
            user,
            activities,
            breastfeeding,
            visits,
            data,
        })
    }
}

/// Owns the feeding stopwatch and the task that ticks it once per second.
#[derive(Clone)]
pub struct FeedingTimerService {
    timer: Arc<Mutex<FeedingTimer>>,
    cancel: Arc<Mutex<Option<watch::Sender<bool>>>>,
    period: Duration,
}

impl Default for FeedingTimerService {
    fn default() -> Self {
        Self::with_period(Duration::from_secs(1))
    }
}

impl FeedingTimerService {
    pub fn with_period(period: Duration) -> Self {
        Self {
            timer: Arc::new(Mutex::new(FeedingTimer::default())),
            cancel: Arc::new(Mutex::new(None)),
            period,
        }
    }

    pub async fn start(&self, side: Side, now: DateTime<Utc>, settings: &TimeSettings) -> TimerStatus {
        let status = {
            let mut timer = self.timer.lock().await;
            timer.start(side, now);
            timer.status(settings)
        };
        self.ensure_ticking().await;
        status
    }

    pub async fn toggle_pause(&self, settings: &TimeSettings) -> TimerStatus {
        let mut timer = self.timer.lock().await;
        timer.toggle_pause();
        timer.status(settings)
    }

    pub async fn switch_side(&self, settings: &TimeSettings) -> TimerStatus {
        let mut timer = self.timer.lock().await;
        timer.switch_side();
        timer.status(settings)
    }

    pub async fn status(&self, settings: &TimeSettings) -> TimerStatus {
        self.timer.lock().await.status(settings)
    }

    /// Save the timed session. The timer is reset only after the API accepted
    /// it; on failure it stays paused so the save can be retried.
    pub async fn stop(
        &self,
        client: &dyn LucinkaClient,
        now: DateTime<Utc>,
    ) -> McpResult<Option<NewBreastfeeding>> {
        let payload = self.timer.lock().await.finish(now);
        let Some(payload) = payload else {
            return Ok(None);
        };
        client.create_breastfeeding(&payload).await?;
        self.reset().await;
        Ok(Some(payload))
    }

    pub async fn reset(&self) {
        self.timer.lock().await.reset();
        if let Some(tx) = self.cancel.lock().await.take() {
            let _ = tx.send(true);
        }
    }

    async fn ensure_ticking(&self) {
        let mut cancel = self.cancel.lock().await;
        if cancel.is_some() {
            return;
        }
        let (tx, mut rx) = watch::channel(false);
        *cancel = Some(tx);

        let timer = self.timer.clone();
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => timer.lock().await.tick(),
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("feeding timer ticker stopped");
        });
    }
}
