//! Shared mock `LucinkaClient` used by the unit tests.
#![cfg(test)]

use async_trait::async_trait;
use tokio::sync::Mutex;

use lucinka_client::{
    ActivityCompletion, ActivityRecord, BreastfeedingRecord, CurrentUser, DataEntry,
    LucinkaClient, LucinkaError, NewActivity, NewBreastfeeding, NewDataEntry, NewVisit,
    PhotoRecord, VisitRecord,
};

/// Serves a fixed set of records and remembers every write.
#[derive(Default)]
pub struct MockClient {
    pub user: Option<CurrentUser>,
    pub activities: Vec<ActivityRecord>,
    pub breastfeeding: Vec<BreastfeedingRecord>,
    pub visits: Vec<VisitRecord>,
    pub data: Vec<DataEntry>,
    pub photos: Vec<PhotoRecord>,
    fail_visits: bool,
    created_activities: Mutex<Vec<NewActivity>>,
    completions: Mutex<Vec<(i64, ActivityCompletion)>>,
    created_feedings: Mutex<Vec<NewBreastfeeding>>,
    deleted_activities: Mutex<Vec<i64>>,
}

fn activity(id: i64, ty: &str, start: &str, end: Option<&str>) -> ActivityRecord {
    ActivityRecord {
        id,
        activity_type: ty.into(),
        start_dt: start.into(),
        end_dt: end.map(Into::into),
        notes: None,
    }
}

fn feeding(id: i64, start: &str, end: &str, left: f64, right: f64) -> BreastfeedingRecord {
    BreastfeedingRecord {
        id,
        start_dt: start.into(),
        end_dt: end.into(),
        left_duration: Some(left),
        right_duration: Some(right),
        is_pumped: false,
        is_breast: true,
        ml_amount: None,
    }
}

fn entry(id: i64, date: &str, weight: Option<f64>, height: Option<f64>) -> DataEntry {
    DataEntry {
        id,
        date: date.into(),
        weight,
        height,
        notes: None,
    }
}

impl MockClient {
    /// One Monday (2026-01-12, UTC) of a typical day plus a few growth entries.
    pub fn with_fixture() -> Self {
        let mut pumped = feeding(12, "2026-01-12T12:00:00Z", "2026-01-12T12:10:00Z", 5.0, 5.0);
        pumped.is_pumped = true;
        Self {
            user: Some(CurrentUser {
                id: 1,
                username: "mama".into(),
                is_admin: false,
            }),
            activities: vec![
                activity(1, "sleeping", "2026-01-11T22:30:00Z", Some("2026-01-12T06:00:00Z")),
                activity(2, "tummy_time", "2026-01-12T09:00:00Z", Some("2026-01-12T09:20:00Z")),
                activity(3, "walking", "2026-01-12T14:00:00Z", None),
            ],
            breastfeeding: vec![
                feeding(10, "2026-01-12T07:00:00Z", "2026-01-12T07:25:00Z", 12.0, 13.0),
                feeding(11, "2026-01-12T11:00:00Z", "2026-01-12T11:15:00Z", 15.0, 0.0),
                pumped,
            ],
            visits: vec![VisitRecord {
                id: 20,
                date: "2026-01-12T10:00:00Z".into(),
                doctor: "Dr. Novak".into(),
                location: "Praha".into(),
                visit_type: "checkup".into(),
                notes: None,
            }],
            data: vec![
                entry(30, "2025-10-10", Some(3.2), Some(50.0)),
                entry(31, "2025-11-09", Some(4.1), Some(54.0)),
                entry(32, "2026-01-10", Some(5.3), None),
            ],
            photos: vec![PhotoRecord {
                id: 40,
                date: "2026-01-01".into(),
                notes: Some("first smile".into()),
                ext: ".jpg".into(),
            }],
            ..Default::default()
        }
    }

    pub fn admin(mut self) -> Self {
        if let Some(user) = self.user.as_mut() {
            user.is_admin = true;
        }
        self
    }

    pub fn failing_visits(mut self) -> Self {
        self.fail_visits = true;
        self
    }

    pub async fn created_activities(&self) -> Vec<NewActivity> {
        self.created_activities.lock().await.clone()
    }

    pub async fn completions(&self) -> Vec<(i64, ActivityCompletion)> {
        self.completions.lock().await.clone()
    }

    pub async fn created_feedings(&self) -> Vec<NewBreastfeeding> {
        self.created_feedings.lock().await.clone()
    }

    pub async fn deleted_activities(&self) -> Vec<i64> {
        self.deleted_activities.lock().await.clone()
    }
}

#[async_trait]
impl LucinkaClient for MockClient {
    async fn login(&self) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn logout(&self) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn get_current_user(&self) -> Result<CurrentUser, LucinkaError> {
        self.user
            .clone()
            .ok_or_else(|| LucinkaError::Auth("not logged in".into()))
    }

    async fn get_activities(&self) -> Result<Vec<ActivityRecord>, LucinkaError> {
        Ok(self.activities.clone())
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<(), LucinkaError> {
        self.created_activities.lock().await.push(activity.clone());
        Ok(())
    }

    async fn complete_activity(
        &self,
        activity_id: i64,
        completion: &ActivityCompletion,
    ) -> Result<(), LucinkaError> {
        self.completions
            .lock()
            .await
            .push((activity_id, completion.clone()));
        Ok(())
    }

    async fn delete_activity(&self, activity_id: i64) -> Result<(), LucinkaError> {
        self.deleted_activities.lock().await.push(activity_id);
        Ok(())
    }

    async fn get_breastfeeding(&self) -> Result<Vec<BreastfeedingRecord>, LucinkaError> {
        Ok(self.breastfeeding.clone())
    }

    async fn create_breastfeeding(&self, session: &NewBreastfeeding) -> Result<(), LucinkaError> {
        self.created_feedings.lock().await.push(session.clone());
        Ok(())
    }

    async fn delete_breastfeeding(&self, _session_id: i64) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn get_visits(&self) -> Result<Vec<VisitRecord>, LucinkaError> {
        if self.fail_visits {
            return Err(LucinkaError::Auth("session expired".into()));
        }
        Ok(self.visits.clone())
    }

    async fn create_visit(&self, _visit: &NewVisit) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn delete_visit(&self, _visit_id: i64) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn get_data(&self) -> Result<Vec<DataEntry>, LucinkaError> {
        Ok(self.data.clone())
    }

    async fn create_data_entry(&self, _entry: &NewDataEntry) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn delete_data_entry(&self, _entry_id: i64) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn get_photos(&self) -> Result<Vec<PhotoRecord>, LucinkaError> {
        Ok(self.photos.clone())
    }

    async fn delete_photo(&self, _photo_id: i64) -> Result<(), LucinkaError> {
        Ok(())
    }

    async fn download_photo(
        &self,
        filename: &str,
        output_path: Option<std::path::PathBuf>,
    ) -> Result<Option<String>, LucinkaError> {
        if !self.photos.iter().any(|p| p.storage_filename() == filename) {
            return Err(LucinkaError::NotFound(filename.to_string()));
        }
        match output_path {
            Some(_) => Ok(None),
            None => Ok(Some("aGVsbG8=".into())),
        }
    }
}
