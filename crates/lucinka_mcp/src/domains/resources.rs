use rmcp::model::RawResource;
use schemars::JsonSchema;
use serde::Serialize;

use super::feeding::LastFeeding;
use super::feeding_timer::TimerStatus;
use super::sessions::SessionView;
use super::statistics::WindowStatistics;

pub const DASHBOARD_URI: &str = "lucinka://dashboard";

/// Descriptor for the dashboard resource; `lib.rs` fills in the payload.
pub fn dashboard_resource() -> RawResource {
    let mut resource = RawResource::new(DASHBOARD_URI, "Baby Dashboard");
    resource.description = Some(
        "Today's activity totals, ongoing activities, last feeding, latest weight and the feeding timer"
            .to_string(),
    );
    resource.mime_type = Some("application/json".to_string());
    resource
}

#[derive(Clone, Debug, Serialize, JsonSchema)]
pub struct Dashboard {
    pub username: String,
    pub generated_at: String,
    pub today: WindowStatistics,
    pub ongoing: Vec<SessionView>,
    pub last_feeding: Option<LastFeeding>,
    pub latest_weight_kg: Option<f64>,
    pub age_months: f64,
    pub feeding_timer: TimerStatus,
}
