use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, GetPromptRequestParams, GetPromptResult, ListPromptsResult, ListResourcesResult,
    PaginatedRequestParams, ReadResourceRequestParams, ReadResourceResult, ResourceContents,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer};
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lucinka_client::{
    ActivityCompletion, CurrentUser, LucinkaClient, NewActivity, NewBreastfeeding,
    ValidationError,
};

pub mod config;
pub mod domains;
pub mod error;
pub mod middleware;
mod prompts;
pub mod services;
pub mod store;
mod test_utils;

pub use config::AnalyticsConfig;
pub use error::{McpError, McpResult};

use domains::activity_types::{ActivityTypeDefinition, ActivityTypeRegistry, RegisteredType};
use domains::buckets::{self, AllDays, MonthBucket, MonthFilter};
use domains::feeding::{self, DailyFeeding, FeedingSummary, HourlyBin, LastFeeding};
use domains::feeding_timer::{Side, TimerStatus};
use domains::growth::{self, GrowthSummary};
use domains::resources::{self, Dashboard};
use domains::sessions::{MergedSessions, SessionView};
use domains::statistics::{
    self, PeriodSummary, StatisticsOptions, StatisticsReport, StatisticsWindow, WindowStatistics,
};
use domains::time::{self, TimeSettings, YearMonth};
use services::{FeedingTimerService, Snapshot, SnapshotService};
use store::{Locale, PreferenceSnapshot, Preferences, Theme};

#[derive(Clone)]
pub struct LucinkaMcpHandler {
    client: Arc<dyn LucinkaClient>,
    config: Arc<AnalyticsConfig>,
    snapshots: SnapshotService,
    timer: FeedingTimerService,
    preferences: Preferences,
    clock: fn() -> DateTime<Utc>,
    tool_router: rmcp::handler::server::tool::ToolRouter<LucinkaMcpHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<LucinkaMcpHandler>,
}

// === Parameters ===

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct MonthParams {
    /// Month as `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListSessionsParams {
    pub order: Option<SessionOrder>,
    /// Only sessions of this activity type (e.g. `sleeping`, `eating`).
    pub activity_type: Option<String>,
    /// Only activities that have not been ended yet.
    pub ongoing_only: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct TimelineParams {
    /// Month as `YYYY-MM`; defaults to the current month. Ignored for admins.
    pub month: Option<String>,
    /// Count doctor visits in the summary (default false).
    pub include_visits: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct StatisticsParams {
    /// Month for the monthly column, `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
    pub include_visits: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GrowthParams {
    /// Number of reference months to chart (default 7).
    pub reference_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct FeedingSummaryParams {
    /// Keep only the most recent N days in the daily list.
    pub days: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StartActivityParams {
    pub activity_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct EndActivityParams {
    pub activity_id: i64,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ManualActivityParams {
    pub activity_type: String,
    /// Local start, `YYYY-MM-DDTHH:MM`.
    pub start: Option<String>,
    /// Local end, `YYYY-MM-DDTHH:MM`.
    pub end: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DeleteSessionParams {
    /// Session id as listed by `list_sessions`.
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ManualFeedingParams {
    /// Local date, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Local start time, `HH:MM`.
    pub time: Option<String>,
    pub left_minutes: Option<f64>,
    pub right_minutes: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct TimerStartParams {
    pub side: Side,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DownloadPhotoParams {
    pub photo_id: Option<i64>,
    /// Stored file name such as `40.jpg`; used when `photo_id` is absent.
    pub filename: Option<String>,
    /// Write the file here instead of returning it base64-encoded.
    pub output_path: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct UpdatePreferencesParams {
    pub theme: Option<Theme>,
    pub locale: Option<Locale>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DailyReportParams {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

// === Results ===

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionListResult {
    pub total: usize,
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DayGroupView {
    pub date_key: String,
    pub label: String,
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DayGroupsResult {
    /// `None` when every month is shown.
    pub month_key: Option<String>,
    pub days: Vec<DayGroupView>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TimelineResult {
    pub month_key: Option<String>,
    pub summary: PeriodSummary,
    pub months: Vec<MonthBucket>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct MonthOption {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AvailableMonthsResult {
    pub current: String,
    pub months: Vec<MonthOption>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HourlyResult {
    pub bins: Vec<HourlyBin>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ActivityTypesResult {
    pub types: Vec<RegisteredType>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ActivityWriteResult {
    pub message: String,
    pub ongoing: Vec<SessionView>,
    pub today: WindowStatistics,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FeedingWriteResult {
    pub message: String,
    pub saved: NewBreastfeeding,
    pub last: Option<LastFeeding>,
    pub today: Option<DailyFeeding>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TimerStopResult {
    pub message: String,
    pub saved: Option<NewBreastfeeding>,
    pub status: TimerStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PhotoView {
    pub id: i64,
    pub date: String,
    pub notes: Option<String>,
    pub filename: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PhotosResult {
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PhotoDownloadResult {
    pub filename: String,
    pub path: Option<String>,
    pub base64: Option<String>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn parse_month(raw: Option<&str>, fallback: YearMonth) -> McpResult<YearMonth> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<YearMonth>()
            .map_err(|e| McpError::InvalidArgument(e.to_string())),
        None => Ok(fallback),
    }
}

impl LucinkaMcpHandler {
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn settings(&self) -> &TimeSettings {
        &self.config.time
    }

    fn current_month(&self) -> YearMonth {
        YearMonth::of(time::local_date(self.now(), self.settings()))
    }

    async fn registry(&self) -> McpResult<ActivityTypeRegistry> {
        Ok(ActivityTypeRegistry::with_custom(
            self.preferences.custom_types().await?,
        ))
    }

    fn parse_local(&self, raw: Option<&str>) -> McpResult<Option<DateTime<Utc>>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => time::parse_local_datetime(s, self.settings())
                .map(Some)
                .ok_or_else(|| {
                    McpError::InvalidArgument(format!("cannot read '{s}' as a local date and time"))
                }),
        }
    }

    fn viewer_filter(&self, snapshot: &Snapshot, month: Option<&str>) -> McpResult<MonthFilter> {
        let month = parse_month(month, self.current_month())?;
        Ok(MonthFilter::for_viewer(snapshot.user.is_admin, month))
    }

    fn today_statistics(&self, merged: &MergedSessions, options: &StatisticsOptions) -> WindowStatistics {
        let buckets = buckets::bucket_days(
            merged.as_slice(),
            self.settings(),
            &AllDays,
            self.config.span_policy,
        );
        StatisticsWindow::Today
            .range(self.now(), self.settings())
            .map(|r| statistics::aggregate(&buckets, r, options))
            .unwrap_or_default()
    }

    async fn activity_write_result(&self, message: String) -> McpResult<ActivityWriteResult> {
        let snapshot = self.snapshots.load().await?;
        let merged = snapshot.sessions(self.settings());
        Ok(ActivityWriteResult {
            message,
            ongoing: merged
                .ongoing()
                .into_iter()
                .map(|s| s.view(self.settings()))
                .collect(),
            today: self.today_statistics(&merged, &StatisticsOptions::default()),
        })
    }

    async fn ensure_known_type(&self, activity_type: &str) -> McpResult<ActivityTypeRegistry> {
        let registry = self.registry().await?;
        if registry.get(activity_type).is_none() {
            return Err(McpError::InvalidArgument(format!(
                "unknown activity type '{activity_type}'"
            )));
        }
        if !registry.is_loggable(activity_type) {
            return Err(ValidationError::DerivedActivityType(activity_type.to_string()).into());
        }
        Ok(registry)
    }

    // === Views ===

    pub async fn current_user(&self) -> McpResult<CurrentUser> {
        Ok(self.client.get_current_user().await?)
    }

    pub async fn sessions(&self, p: ListSessionsParams) -> McpResult<SessionListResult> {
        let snapshot = self.snapshots.load().await?;
        let merged = snapshot.sessions(self.settings());
        let ordered = match p.order.unwrap_or_default() {
            SessionOrder::NewestFirst => merged.newest_first(),
            SessionOrder::OldestFirst => merged.oldest_first(),
        };
        let ongoing_only = p.ongoing_only.unwrap_or(false);
        let mut sessions: Vec<SessionView> = ordered
            .into_iter()
            .filter(|s| p.activity_type.as_deref().is_none_or(|t| s.activity_type == t))
            .filter(|s| !ongoing_only || s.is_ongoing())
            .map(|s| s.view(self.settings()))
            .collect();
        let total = sessions.len();
        if let Some(limit) = p.limit {
            sessions.truncate(limit);
        }
        Ok(SessionListResult { total, sessions })
    }

    pub async fn sessions_by_day(&self, p: MonthParams) -> McpResult<DayGroupsResult> {
        let snapshot = self.snapshots.load().await?;
        let filter = self.viewer_filter(&snapshot, p.month.as_deref())?;
        let merged = snapshot.sessions(self.settings());
        let days = merged
            .group_by_start_day(self.settings(), &filter)
            .into_iter()
            .map(|g| DayGroupView {
                date_key: time::date_key(g.date),
                label: time::full_label(g.date),
                sessions: g.sessions.iter().map(|s| s.view(self.settings())).collect(),
            })
            .collect();
        Ok(DayGroupsResult {
            month_key: match filter {
                MonthFilter::Month(m) => Some(m.to_string()),
                MonthFilter::AllDays => None,
            },
            days,
        })
    }

    pub async fn timeline(&self, p: TimelineParams) -> McpResult<TimelineResult> {
        let snapshot = self.snapshots.load().await?;
        let filter = self.viewer_filter(&snapshot, p.month.as_deref())?;
        let merged = snapshot.sessions(self.settings());
        let day_buckets = buckets::bucket_days(
            merged.as_slice(),
            self.settings(),
            &filter,
            self.config.span_policy,
        );
        let options = StatisticsOptions {
            include_visits: p.include_visits.unwrap_or(false),
        };
        Ok(TimelineResult {
            month_key: match filter {
                MonthFilter::Month(m) => Some(m.to_string()),
                MonthFilter::AllDays => None,
            },
            summary: statistics::period_summary(&day_buckets, &options),
            months: buckets::bucket_months(day_buckets),
        })
    }

    pub async fn statistics(&self, p: StatisticsParams) -> McpResult<StatisticsReport> {
        let month = parse_month(p.month.as_deref(), self.current_month())?;
        let registry = self.registry().await?;
        let snapshot = self.snapshots.load().await?;
        let merged = snapshot.sessions(self.settings());
        let day_buckets = buckets::bucket_days(
            merged.as_slice(),
            self.settings(),
            &AllDays,
            self.config.span_policy,
        );
        let options = StatisticsOptions {
            include_visits: p.include_visits.unwrap_or(false),
        };
        Ok(statistics::report(
            &day_buckets,
            self.now(),
            month,
            &registry,
            &options,
            self.settings(),
        ))
    }

    pub async fn available_months(&self) -> McpResult<AvailableMonthsResult> {
        let snapshot = self.snapshots.load().await?;
        let months = snapshot
            .sessions(self.settings())
            .available_months(self.settings())
            .into_iter()
            .map(|m| MonthOption {
                key: m.to_string(),
                label: m.label(),
            })
            .collect();
        Ok(AvailableMonthsResult {
            current: self.current_month().to_string(),
            months,
        })
    }

    pub async fn growth(&self, p: GrowthParams) -> McpResult<GrowthSummary> {
        let entries = self.client.get_data().await?;
        let today = time::local_date(self.now(), self.settings());
        Ok(growth::summarize(
            &entries,
            self.config.birth_date,
            today,
            p.reference_limit
                .unwrap_or(self.config.growth_reference_limit),
        ))
    }

    pub async fn feeding_summary(&self, p: FeedingSummaryParams) -> McpResult<FeedingSummary> {
        let records = self.client.get_breastfeeding().await?;
        let mut summary = feeding::summarize(&records, self.now(), self.settings());
        if let Some(days) = p.days {
            summary.daily.truncate(days);
        }
        Ok(summary)
    }

    pub async fn feeding_hourly(&self) -> McpResult<HourlyResult> {
        let records = self.client.get_breastfeeding().await?;
        Ok(HourlyResult {
            bins: feeding::hourly_distribution(&records, self.settings()),
        })
    }

    pub async fn activity_types(&self) -> McpResult<ActivityTypesResult> {
        Ok(ActivityTypesResult {
            types: self.registry().await?.iter().cloned().collect(),
        })
    }

    pub async fn dashboard(&self) -> McpResult<Dashboard> {
        let snapshot = self.snapshots.load().await?;
        let settings = self.settings();
        let now = self.now();
        let merged = snapshot.sessions(settings);
        let observations = growth::observations(&snapshot.data);
        Ok(Dashboard {
            username: snapshot.user.username.clone(),
            generated_at: time::format_local(now, settings),
            today: self.today_statistics(&merged, &StatisticsOptions::default()),
            ongoing: merged
                .ongoing()
                .into_iter()
                .map(|s| s.view(settings))
                .collect(),
            last_feeding: feeding::last_feeding(&snapshot.breastfeeding, now, settings),
            latest_weight_kg: observations.iter().rev().find_map(|o| o.weight_kg),
            age_months: round1(growth::age_in_months(
                self.config.birth_date,
                time::local_date(now, settings),
            )),
            feeding_timer: self.timer.status(settings).await,
        })
    }

    pub async fn photos(&self) -> McpResult<PhotosResult> {
        let photos = self.client.get_photos().await?;
        Ok(PhotosResult {
            photos: photos
                .into_iter()
                .map(|p| PhotoView {
                    filename: p.storage_filename(),
                    id: p.id,
                    date: p.date,
                    notes: p.notes,
                })
                .collect(),
        })
    }

    pub async fn preferences(&self) -> McpResult<PreferenceSnapshot> {
        Ok(self.preferences.snapshot().await?)
    }

    // === Writes ===

    pub async fn register_activity_type(
        &self,
        definition: ActivityTypeDefinition,
    ) -> McpResult<ActivityTypesResult> {
        let mut registry = self.registry().await?;
        registry.register_custom(definition)?;
        self.preferences.set_custom_types(&registry.custom()).await?;
        Ok(ActivityTypesResult {
            types: registry.iter().cloned().collect(),
        })
    }

    pub async fn start_activity(&self, p: StartActivityParams) -> McpResult<ActivityWriteResult> {
        let registry = self.ensure_known_type(&p.activity_type).await?;
        let mut activity = NewActivity::started(&p.activity_type, self.now())?;
        activity.notes = non_empty(p.notes);
        self.client.create_activity(&activity).await?;
        self.activity_write_result(format!("Started {}", registry.label(&p.activity_type)))
            .await
    }

    pub async fn end_activity(&self, p: EndActivityParams) -> McpResult<ActivityWriteResult> {
        let snapshot = self.snapshots.load().await?;
        let merged = snapshot.sessions(self.settings());
        let id = p.activity_id.to_string();
        let session = merged
            .find(&id)
            .filter(|s| s.is_ongoing())
            .ok_or_else(|| McpError::NotFound(format!("no ongoing activity with id {id}")))?;
        let label = session.activity_type.clone();
        self.client
            .complete_activity(p.activity_id, &ActivityCompletion::at(self.now()))
            .await?;
        self.activity_write_result(format!("Ended {label}")).await
    }

    pub async fn add_manual_activity(
        &self,
        p: ManualActivityParams,
    ) -> McpResult<ActivityWriteResult> {
        let registry = self.ensure_known_type(&p.activity_type).await?;
        let start = self.parse_local(p.start.as_deref())?;
        let end = self.parse_local(p.end.as_deref())?;
        let mut activity = NewActivity::manual(&p.activity_type, start, end)?;
        activity.notes = non_empty(p.notes);
        self.client.create_activity(&activity).await?;
        self.activity_write_result(format!("Added {}", registry.label(&p.activity_type)))
            .await
    }

    pub async fn delete_session(&self, p: DeleteSessionParams) -> McpResult<ActivityWriteResult> {
        let snapshot = self.snapshots.load().await?;
        let merged = snapshot.sessions(self.settings());
        let session = merged
            .find(&p.session_id)
            .ok_or_else(|| McpError::NotFound(format!("session {}", p.session_id)))?;
        if !session.is_deletable() {
            return Err(McpError::InvalidArgument(format!(
                "session {} is derived from another record and cannot be deleted here",
                p.session_id
            )));
        }
        self.client.delete_activity(session.record_id).await?;
        self.activity_write_result(format!("Deleted session {}", p.session_id))
            .await
    }

    pub async fn add_manual_feeding(&self, p: ManualFeedingParams) -> McpResult<FeedingWriteResult> {
        let date = non_empty(p.date).ok_or(ValidationError::MissingField("date"))?;
        let clock = non_empty(p.time).ok_or(ValidationError::MissingField("time"))?;
        let start = time::parse_local_date_time(&date, &clock, self.settings()).ok_or_else(|| {
            McpError::InvalidArgument(format!("cannot read '{date} {clock}' as a local date and time"))
        })?;
        let session = NewBreastfeeding::manual(
            Some(start),
            p.left_minutes.unwrap_or(0.0),
            p.right_minutes.unwrap_or(0.0),
        )?;
        self.client.create_breastfeeding(&session).await?;

        let records = self.client.get_breastfeeding().await?;
        let now = self.now();
        let today = time::local_date(now, self.settings());
        let summary = feeding::summarize(&records, now, self.settings());
        Ok(FeedingWriteResult {
            message: format!("Saved feeding on {date} at {clock}"),
            saved: session,
            last: summary.last,
            today: summary.daily.into_iter().find(|d| d.date == today),
        })
    }

    pub async fn timer_start(&self, side: Side) -> TimerStatus {
        self.timer.start(side, self.now(), self.settings()).await
    }

    pub async fn timer_switch(&self) -> TimerStatus {
        self.timer.switch_side(self.settings()).await
    }

    pub async fn timer_pause(&self) -> TimerStatus {
        self.timer.toggle_pause(self.settings()).await
    }

    pub async fn timer_status(&self) -> TimerStatus {
        self.timer.status(self.settings()).await
    }

    pub async fn timer_stop(&self) -> McpResult<TimerStopResult> {
        let saved = self.timer.stop(self.client.as_ref(), self.now()).await?;
        let message = match &saved {
            Some(s) => format!(
                "Saved feeding: {} min left, {} min right",
                s.left_duration, s.right_duration
            ),
            None => "Nothing to save yet".to_string(),
        };
        Ok(TimerStopResult {
            message,
            saved,
            status: self.timer.status(self.settings()).await,
        })
    }

    pub async fn download_photo(&self, p: DownloadPhotoParams) -> McpResult<PhotoDownloadResult> {
        let filename = match (p.photo_id, non_empty(p.filename)) {
            (Some(id), _) => self
                .client
                .get_photos()
                .await?
                .into_iter()
                .find(|photo| photo.id == id)
                .map(|photo| photo.storage_filename())
                .ok_or_else(|| McpError::NotFound(format!("photo {id}")))?,
            (None, Some(name)) => name,
            (None, None) => {
                return Err(McpError::InvalidArgument(
                    "either photo_id or filename is required".into(),
                ));
            }
        };
        let output = non_empty(p.output_path);
        let base64 = self
            .client
            .download_photo(&filename, output.as_ref().map(PathBuf::from))
            .await?;
        Ok(PhotoDownloadResult {
            filename,
            path: if base64.is_none() { output } else { None },
            base64,
        })
    }

    pub async fn update_preferences(
        &self,
        p: UpdatePreferencesParams,
    ) -> McpResult<PreferenceSnapshot> {
        if let Some(theme) = p.theme {
            self.preferences.set_theme(theme).await?;
        }
        if let Some(locale) = p.locale {
            self.preferences.set_locale(locale).await?;
        }
        self.preferences().await
    }
}

#[tool_router]
#[prompt_router]
impl LucinkaMcpHandler {
    pub fn new(client: Arc<dyn LucinkaClient>) -> Self {
        Self::with_config(client, AnalyticsConfig::default(), Preferences::in_memory())
    }

    pub fn with_config(
        client: Arc<dyn LucinkaClient>,
        config: AnalyticsConfig,
        preferences: Preferences,
    ) -> Self {
        Self {
            snapshots: SnapshotService::new(client.clone()),
            client,
            config: Arc::new(config),
            timer: FeedingTimerService::default(),
            preferences,
            clock: Utc::now,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    #[tool(name = "get_current_user", description = "Get the logged-in user")]
    async fn get_current_user(&self) -> Result<Json<CurrentUser>, String> {
        Ok(Json(self.current_user().await?))
    }

    #[tool(
        name = "list_sessions",
        description = "List activity, feeding and visit sessions, newest first by default"
    )]
    async fn list_sessions(
        &self,
        params: Parameters<ListSessionsParams>,
    ) -> Result<Json<SessionListResult>, String> {
        Ok(Json(self.sessions(params.0).await?))
    }

    #[tool(
        name = "list_sessions_by_day",
        description = "Sessions grouped by the local day they started, for one month (admins see all)"
    )]
    async fn list_sessions_by_day(
        &self,
        params: Parameters<MonthParams>,
    ) -> Result<Json<DayGroupsResult>, String> {
        Ok(Json(self.sessions_by_day(params.0).await?))
    }

    #[tool(
        name = "get_activity_timeline",
        description = "Day and month buckets of interval slices, with sessions split at midnight"
    )]
    async fn get_activity_timeline(
        &self,
        params: Parameters<TimelineParams>,
    ) -> Result<Json<TimelineResult>, String> {
        Ok(Json(self.timeline(params.0).await?))
    }

    #[tool(
        name = "get_activity_statistics",
        description = "Per-type counts and durations for today, this week and a month, with legend"
    )]
    async fn get_activity_statistics(
        &self,
        params: Parameters<StatisticsParams>,
    ) -> Result<Json<StatisticsReport>, String> {
        Ok(Json(self.statistics(params.0).await?))
    }

    #[tool(
        name = "get_available_months",
        description = "Months that contain completed sessions, newest first"
    )]
    async fn get_available_months(&self) -> Result<Json<AvailableMonthsResult>, String> {
        Ok(Json(self.available_months().await?))
    }

    #[tool(
        name = "get_growth_chart",
        description = "Weight observations aligned with the reference percentile curves"
    )]
    async fn get_growth_chart(
        &self,
        params: Parameters<GrowthParams>,
    ) -> Result<Json<GrowthSummary>, String> {
        Ok(Json(self.growth(params.0).await?))
    }

    #[tool(
        name = "get_feeding_summary",
        description = "Last feeding plus daily and monthly breastfeeding totals"
    )]
    async fn get_feeding_summary(
        &self,
        params: Parameters<FeedingSummaryParams>,
    ) -> Result<Json<FeedingSummary>, String> {
        Ok(Json(self.feeding_summary(params.0).await?))
    }

    #[tool(
        name = "get_feeding_hourly",
        description = "Feeding sessions and average duration by hour of day"
    )]
    async fn get_feeding_hourly(&self) -> Result<Json<HourlyResult>, String> {
        Ok(Json(self.feeding_hourly().await?))
    }

    #[tool(name = "list_activity_types", description = "List built-in, derived and custom activity types")]
    async fn list_activity_types(&self) -> Result<Json<ActivityTypesResult>, String> {
        Ok(Json(self.activity_types().await?))
    }

    #[tool(
        name = "register_activity_type",
        description = "Add a custom activity type (key, label, #rrggbb color, icon)"
    )]
    async fn register_activity_type_tool(
        &self,
        params: Parameters<ActivityTypeDefinition>,
    ) -> Result<Json<ActivityTypesResult>, String> {
        Ok(Json(self.register_activity_type(params.0).await?))
    }

    #[tool(name = "start_activity", description = "Start an activity now and leave it open")]
    async fn start_activity_tool(
        &self,
        params: Parameters<StartActivityParams>,
    ) -> Result<Json<ActivityWriteResult>, String> {
        Ok(Json(self.start_activity(params.0).await?))
    }

    #[tool(name = "end_activity", description = "End an ongoing activity now")]
    async fn end_activity_tool(
        &self,
        params: Parameters<EndActivityParams>,
    ) -> Result<Json<ActivityWriteResult>, String> {
        Ok(Json(self.end_activity(params.0).await?))
    }

    #[tool(
        name = "add_manual_activity",
        description = "Record a completed activity with local start and end times"
    )]
    async fn add_manual_activity_tool(
        &self,
        params: Parameters<ManualActivityParams>,
    ) -> Result<Json<ActivityWriteResult>, String> {
        Ok(Json(self.add_manual_activity(params.0).await?))
    }

    #[tool(
        name = "delete_session",
        description = "Delete a logged activity (feedings and visits cannot be deleted here)"
    )]
    async fn delete_session_tool(
        &self,
        params: Parameters<DeleteSessionParams>,
    ) -> Result<Json<ActivityWriteResult>, String> {
        Ok(Json(self.delete_session(params.0).await?))
    }

    #[tool(
        name = "add_manual_feeding",
        description = "Record a breastfeeding session from a local date, start time and minutes per side"
    )]
    async fn add_manual_feeding_tool(
        &self,
        params: Parameters<ManualFeedingParams>,
    ) -> Result<Json<FeedingWriteResult>, String> {
        Ok(Json(self.add_manual_feeding(params.0).await?))
    }

    #[tool(name = "feeding_timer_start", description = "Start the feeding timer on a side")]
    async fn feeding_timer_start(
        &self,
        params: Parameters<TimerStartParams>,
    ) -> Result<Json<TimerStatus>, String> {
        Ok(Json(self.timer_start(params.0.side).await))
    }

    #[tool(name = "feeding_timer_switch", description = "Switch the feeding timer to the other side")]
    async fn feeding_timer_switch(&self) -> Result<Json<TimerStatus>, String> {
        Ok(Json(self.timer_switch().await))
    }

    #[tool(name = "feeding_timer_pause", description = "Pause or resume the feeding timer")]
    async fn feeding_timer_pause(&self) -> Result<Json<TimerStatus>, String> {
        Ok(Json(self.timer_pause().await))
    }

    #[tool(
        name = "feeding_timer_stop",
        description = "Stop the feeding timer and save the session"
    )]
    async fn feeding_timer_stop(&self) -> Result<Json<TimerStopResult>, String> {
        Ok(Json(self.timer_stop().await?))
    }

    #[tool(name = "feeding_timer_status", description = "Current feeding timer state")]
    async fn feeding_timer_status(&self) -> Result<Json<TimerStatus>, String> {
        Ok(Json(self.timer_status().await))
    }

    #[tool(name = "list_photos", description = "List stored photos with their file names")]
    async fn list_photos(&self) -> Result<Json<PhotosResult>, String> {
        Ok(Json(self.photos().await?))
    }

    #[tool(
        name = "download_photo",
        description = "Download a photo to a path or as base64"
    )]
    async fn download_photo_tool(
        &self,
        params: Parameters<DownloadPhotoParams>,
    ) -> Result<Json<PhotoDownloadResult>, String> {
        Ok(Json(self.download_photo(params.0).await?))
    }

    #[tool(name = "get_preferences", description = "Theme, language and custom activity types")]
    async fn get_preferences(&self) -> Result<Json<PreferenceSnapshot>, String> {
        Ok(Json(self.preferences().await?))
    }

    #[tool(name = "update_preferences", description = "Change theme or language")]
    async fn update_preferences_tool(
        &self,
        params: Parameters<UpdatePreferencesParams>,
    ) -> Result<Json<PreferenceSnapshot>, String> {
        Ok(Json(self.update_preferences(params.0).await?))
    }

    // === MCP Prompts ===

    #[prompt(
        name = "daily-report",
        description = "Summarize one day of sleep, feedings and activities"
    )]
    async fn daily_report(&self, params: Parameters<DailyReportParams>) -> GetPromptResult {
        let date = params
            .0
            .date
            .unwrap_or_else(|| time::date_key(time::local_date(self.now(), self.settings())));

        prompts::daily_report_prompt(&date)
    }

    #[prompt(
        name = "growth-check",
        description = "Review weight against the reference percentiles"
    )]
    async fn growth_check(&self) -> GetPromptResult {
        prompts::growth_check_prompt(&time::date_key(self.config.birth_date))
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for LucinkaMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .build(),
        )
        .with_instructions(
            "Lucinka baby tracker MCP server - sessions, daily and monthly timelines, \
             activity statistics, feeding summaries, the feeding timer and growth charts.",
        )
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: vec![resources::dashboard_resource().no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        if request.uri != resources::DASHBOARD_URI {
            return Err(ErrorData::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ));
        }
        let dashboard = self
            .dashboard()
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        let text = serde_json::to_string_pretty(&dashboard)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(ReadResourceResult::new(vec![
            ResourceContents::TextResourceContents {
                uri: request.uri.clone(),
                mime_type: Some("application/json".to_string()),
                text,
                meta: None,
            },
        ]))
    }
}
