//! Middleware layer for cross-cutting concerns.
//!
//! Sits between the MCP handler and the REST client so that timing and
//! failure logging live in one place instead of in every tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use lucinka_client::{
    ActivityCompletion, ActivityRecord, BreastfeedingRecord, CurrentUser, DataEntry,
    LucinkaClient, LucinkaError, NewActivity, NewBreastfeeding, NewDataEntry, NewVisit,
    PhotoRecord, VisitRecord,
};
use tracing::debug;

/// Wraps any [`LucinkaClient`] and logs each call with its duration.
#[derive(Clone)]
pub struct LoggingMiddleware<C: LucinkaClient> {
    inner: Arc<C>,
}

impl<C: LucinkaClient> LoggingMiddleware<C> {
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    async fn with_logging<F, Fut, T>(&self, operation: F, name: &str) -> Result<T, LucinkaError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = Result<T, LucinkaError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        match &result {
            Ok(_) => debug!("Operation completed: {} in {:?}", name, duration),
            Err(e) => debug!("Operation failed: {} in {:?} - error: {}", name, duration, e),
        }

        result
    }
}

#[async_trait::async_trait]
impl<C: LucinkaClient> LucinkaClient for LoggingMiddleware<C> {
    async fn login(&self) -> Result<(), LucinkaError> {
        self.with_logging(|client| async move { client.login().await }, "login")
            .await
    }

    async fn logout(&self) -> Result<(), LucinkaError> {
        self.with_logging(|client| async move { client.logout().await }, "logout")
            .await
    }

    async fn get_current_user(&self) -> Result<CurrentUser, LucinkaError> {
        self.with_logging(
            |client| async move { client.get_current_user().await },
            "get_current_user",
        )
        .await
    }

    async fn get_activities(&self) -> Result<Vec<ActivityRecord>, LucinkaError> {
        self.with_logging(
            |client| async move { client.get_activities().await },
            "get_activities",
        )
        .await
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.create_activity(activity).await },
            &format!("create_activity({})", activity.activity_type),
        )
        .await
    }

    async fn complete_activity(
        &self,
        activity_id: i64,
        completion: &ActivityCompletion,
    ) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.complete_activity(activity_id, completion).await },
            &format!("complete_activity({activity_id})"),
        )
        .await
    }

    async fn delete_activity(&self, activity_id: i64) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.delete_activity(activity_id).await },
            &format!("delete_activity({activity_id})"),
        )
        .await
    }

    async fn get_breastfeeding(&self) -> Result<Vec<BreastfeedingRecord>, LucinkaError> {
        self.with_logging(
            |client| async move { client.get_breastfeeding().await },
            "get_breastfeeding",
        )
        .await
    }

    async fn create_breastfeeding(&self, session: &NewBreastfeeding) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.create_breastfeeding(session).await },
            "create_breastfeeding",
        )
        .await
    }

    async fn delete_breastfeeding(&self, session_id: i64) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.delete_breastfeeding(session_id).await },
            &format!("delete_breastfeeding({session_id})"),
        )
        .await
    }

    async fn get_visits(&self) -> Result<Vec<VisitRecord>, LucinkaError> {
        self.with_logging(|client| async move { client.get_visits().await }, "get_visits")
            .await
    }

    async fn create_visit(&self, visit: &NewVisit) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.create_visit(visit).await },
            "create_visit",
        )
        .await
    }

    async fn delete_visit(&self, visit_id: i64) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.delete_visit(visit_id).await },
            &format!("delete_visit({visit_id})"),
        )
        .await
    }

    async fn get_data(&self) -> Result<Vec<DataEntry>, LucinkaError> {
        self.with_logging(|client| async move { client.get_data().await }, "get_data")
            .await
    }

    async fn create_data_entry(&self, entry: &NewDataEntry) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.create_data_entry(entry).await },
            "create_data_entry",
        )
        .await
    }

    async fn delete_data_entry(&self, entry_id: i64) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.delete_data_entry(entry_id).await },
            &format!("delete_data_entry({entry_id})"),
        )
        .await
    }

    async fn get_photos(&self) -> Result<Vec<PhotoRecord>, LucinkaError> {
        self.with_logging(|client| async move { client.get_photos().await }, "get_photos")
            .await
    }

    async fn delete_photo(&self, photo_id: i64) -> Result<(), LucinkaError> {
        self.with_logging(
            |client| async move { client.delete_photo(photo_id).await },
            &format!("delete_photo({photo_id})"),
        )
        .await
    }

    async fn download_photo(
        &self,
        filename: &str,
        output_path: Option<PathBuf>,
    ) -> Result<Option<String>, LucinkaError> {
        self.with_logging(
            |client| async move { client.download_photo(filename, output_path).await },
            &format!("download_photo({filename})"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockClient;

    #[tokio::test]
    async fn delegates_reads_and_writes() {
        let mw = LoggingMiddleware::new(MockClient::with_fixture());
        assert_eq!(mw.get_current_user().await.unwrap().username, "mama");
        assert_eq!(mw.get_activities().await.unwrap().len(), 3);
        mw.delete_activity(2).await.unwrap();
        assert_eq!(mw.inner.deleted_activities().await, vec![2]);
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let mw = LoggingMiddleware::new(MockClient::with_fixture());
        let err = mw.download_photo("missing.jpg", None).await.unwrap_err();
        assert!(matches!(err, LucinkaError::NotFound(_)));
    }
}
