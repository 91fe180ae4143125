//! `LucinkaClient` trait and a reqwest-based implementation for the lucinka REST API.

use async_trait::async_trait;
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod records;
pub mod utils;

pub use records::{
    ActivityCompletion, ActivityRecord, BreastfeedingRecord, Credentials, CurrentUser, DataEntry,
    NewActivity, NewBreastfeeding, NewDataEntry, NewVisit, PhotoRecord, ValidationError,
    VisitRecord,
};

#[derive(Debug, Error)]
pub enum LucinkaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication required: {0}")]
    Auth(String),
    #[error("admin privileges required: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LucinkaError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => LucinkaError::Auth(body),
            403 => LucinkaError::Forbidden(body),
            404 => LucinkaError::NotFound(body),
            400 | 422 => LucinkaError::InvalidInput(body),
            _ => LucinkaError::Api { status, body },
        }
    }

    /// Errors after which a view should send the user back to login.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, LucinkaError::Auth(_) | LucinkaError::Http(_))
    }
}

#[async_trait]
pub trait LucinkaClient: Send + Sync + 'static {
    /// Open a cookie session with the configured credentials.
    async fn login(&self) -> Result<(), LucinkaError>;
    async fn logout(&self) -> Result<(), LucinkaError>;
    async fn get_current_user(&self) -> Result<CurrentUser, LucinkaError>;

    // === Activities ===

    async fn get_activities(&self) -> Result<Vec<ActivityRecord>, LucinkaError>;
    async fn create_activity(&self, activity: &NewActivity) -> Result<(), LucinkaError>;
    /// Set the end time of an in-progress activity.
    async fn complete_activity(
        &self,
        activity_id: i64,
        completion: &ActivityCompletion,
    ) -> Result<(), LucinkaError>;
    async fn delete_activity(&self, activity_id: i64) -> Result<(), LucinkaError>;

    // === Breastfeeding ===

    async fn get_breastfeeding(&self) -> Result<Vec<BreastfeedingRecord>, LucinkaError>;
    async fn create_breastfeeding(&self, session: &NewBreastfeeding) -> Result<(), LucinkaError>;
    async fn delete_breastfeeding(&self, session_id: i64) -> Result<(), LucinkaError>;

    // === Visits ===

    async fn get_visits(&self) -> Result<Vec<VisitRecord>, LucinkaError>;
    async fn create_visit(&self, visit: &NewVisit) -> Result<(), LucinkaError>;
    async fn delete_visit(&self, visit_id: i64) -> Result<(), LucinkaError>;

    // === Growth data ===

    async fn get_data(&self) -> Result<Vec<DataEntry>, LucinkaError>;
    async fn create_data_entry(&self, entry: &NewDataEntry) -> Result<(), LucinkaError>;
    async fn delete_data_entry(&self, entry_id: i64) -> Result<(), LucinkaError>;

    // === Photos ===

    async fn get_photos(&self) -> Result<Vec<PhotoRecord>, LucinkaError>;
    async fn delete_photo(&self, photo_id: i64) -> Result<(), LucinkaError>;
    /// Download a stored photo. Writes to `output_path` when given and returns
    /// `None`, otherwise returns the file contents base64-encoded.
    async fn download_photo(
        &self,
        filename: &str,
        output_path: Option<std::path::PathBuf>,
    ) -> Result<Option<String>, LucinkaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            LucinkaError::from_status(401, "x".into()),
            LucinkaError::Auth(_)
        ));
        assert!(matches!(
            LucinkaError::from_status(403, "x".into()),
            LucinkaError::Forbidden(_)
        ));
        assert!(matches!(
            LucinkaError::from_status(422, "x".into()),
            LucinkaError::InvalidInput(_)
        ));
        assert!(matches!(
            LucinkaError::from_status(500, "boom".into()),
            LucinkaError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn only_auth_failures_invalidate_the_session() {
        assert!(LucinkaError::Auth("expired".into()).is_session_invalid());
        assert!(!LucinkaError::NotFound("gone".into()).is_session_invalid());
        assert!(!LucinkaError::Forbidden("nope".into()).is_session_invalid());
    }
}
