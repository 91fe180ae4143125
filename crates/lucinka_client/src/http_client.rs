//! HTTP client implementation for the lucinka API.
//!
//! This module provides a reqwest-based implementation of the [`LucinkaClient`](crate::LucinkaClient) trait.
//! The backend authenticates with a session cookie, so the client keeps a cookie
//! store and logs in lazily before the first request.

use crate::records::{
    ActivityCompletion, ActivityRecord, BreastfeedingRecord, Credentials, CurrentUser, DataEntry,
    NewActivity, NewBreastfeeding, NewDataEntry, NewVisit, PhotoRecord, VisitRecord,
};
use crate::{LucinkaClient, LucinkaError};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures_util::StreamExt;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::io::AsyncWriteExt;

/// Client for the lucinka API using reqwest.
#[derive(Debug)]
pub struct ReqwestLucinkaClient {
    base_url: String,
    username: String,
    password: SecretString,
    client: reqwest::Client,
    logged_in: AtomicBool,
}

impl ReqwestLucinkaClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the lucinka backend (e.g., "http://localhost:5000")
    /// * `username` - Account used for the cookie session
    /// * `password` - Password for that account
    pub fn new(base_url: &str, username: impl Into<String>, password: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("reqwest client build should not fail");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password,
            client,
            logged_in: AtomicBool::new(false),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request without session handling and record it.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, LucinkaError> {
        let request = request.build()?;
        let method = request.method().to_string();
        let path = request.url().path().to_string();
        let started = Instant::now();
        let resp = self.client.execute(request).await?;
        let elapsed = started.elapsed();
        let status = resp.status().as_u16();

        metrics::counter!(
            "lucinka_client_requests_total",
            "method" => method.clone(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!("lucinka_client_request_duration_seconds", "method" => method.clone())
            .record(elapsed.as_secs_f64());
        tracing::debug!(
            %method,
            %path,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "lucinka request"
        );
        Ok(resp)
    }

    async fn ensure_session(&self) -> Result<(), LucinkaError> {
        if self.logged_in.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request. A 401 drops the session and the request
    /// is retried once after logging in again.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, LucinkaError> {
        self.ensure_session().await?;
        let retry = request.try_clone();
        let resp = self.dispatch(request).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.logged_in.store(false, Ordering::SeqCst);
            if let Some(retry) = retry {
                tracing::debug!("session rejected, logging in again");
                self.login().await?;
                return self.dispatch(retry).await;
            }
        }
        Ok(resp)
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, LucinkaError> {
        let resp = self.send(request).await?;
        self.handle_response(resp).await
    }

    /// Execute a request with no expected response body.
    async fn execute_empty(&self, request: reqwest::RequestBuilder) -> Result<(), LucinkaError> {
        let resp = self.send(request).await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(())
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, LucinkaError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> LucinkaError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        LucinkaError::from_status(status, body_snippet)
    }

    /// Download a file from a URL, optionally saving to disk.
    async fn download_file(
        &self,
        url: String,
        output_path: Option<PathBuf>,
    ) -> Result<Option<String>, LucinkaError> {
        let resp = self.send(self.client.get(&url)).await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }

        if let Some(path) = output_path {
            let mut stream = resp.bytes_stream();
            let mut file = tokio::fs::File::create(&path).await?;
            while let Some(chunk) = stream.next().await {
                let bytes = chunk.map_err(LucinkaError::Http)?;
                file.write_all(&bytes).await?;
            }
            file.sync_all().await?;
            return Ok(None);
        }

        let bytes = resp.bytes().await?;
        Ok(Some(STANDARD.encode(&bytes)))
    }
}

#[async_trait]
impl LucinkaClient for ReqwestLucinkaClient {
    async fn login(&self) -> Result<(), LucinkaError> {
        let credentials = Credentials {
            username: self.username.clone(),
            password: self.password.expose_secret().to_string(),
        };
        let resp = self
            .dispatch(self.client.post(self.url("login")).json(&credentials))
            .await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        self.logged_in.store(true, Ordering::SeqCst);
        tracing::info!(username = %self.username, "logged in to lucinka");
        Ok(())
    }

    async fn logout(&self) -> Result<(), LucinkaError> {
        let resp = self.dispatch(self.client.post(self.url("logout"))).await?;
        self.logged_in.store(false, Ordering::SeqCst);
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(())
    }

    async fn get_current_user(&self) -> Result<CurrentUser, LucinkaError> {
        self.execute_json(self.client.get(self.url("current-user")))
            .await
    }

    async fn get_activities(&self) -> Result<Vec<ActivityRecord>, LucinkaError> {
        self.execute_json(self.client.get(self.url("activities")))
            .await
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<(), LucinkaError> {
        self.execute_empty(self.client.post(self.url("activities")).json(activity))
            .await
    }

    async fn complete_activity(
        &self,
        activity_id: i64,
        completion: &ActivityCompletion,
    ) -> Result<(), LucinkaError> {
        let url = self.url(&format!("activities/{activity_id}"));
        self.execute_empty(self.client.patch(url).json(completion))
            .await
    }

    async fn delete_activity(&self, activity_id: i64) -> Result<(), LucinkaError> {
        let url = self.url(&format!("activities/{activity_id}"));
        self.execute_empty(self.client.delete(url)).await
    }

    async fn get_breastfeeding(&self) -> Result<Vec<BreastfeedingRecord>, LucinkaError> {
        self.execute_json(self.client.get(self.url("breastfeeding")))
            .await
    }

    async fn create_breastfeeding(&self, session: &NewBreastfeeding) -> Result<(), LucinkaError> {
        self.execute_empty(self.client.post(self.url("breastfeeding")).json(session))
            .await
    }

    async fn delete_breastfeeding(&self, session_id: i64) -> Result<(), LucinkaError> {
        let url = self.url(&format!("breastfeeding/{session_id}"));
        self.execute_empty(self.client.delete(url)).await
    }

    async fn get_visits(&self) -> Result<Vec<VisitRecord>, LucinkaError> {
        self.execute_json(self.client.get(self.url("visits"))).await
    }

    async fn create_visit(&self, visit: &NewVisit) -> Result<(), LucinkaError> {
        self.execute_empty(self.client.post(self.url("visits")).json(visit))
            .await
    }

    async fn delete_visit(&self, visit_id: i64) -> Result<(), LucinkaError> {
        let url = self.url(&format!("visits/{visit_id}"));
        self.execute_empty(self.client.delete(url)).await
    }

    async fn get_data(&self) -> Result<Vec<DataEntry>, LucinkaError> {
        self.execute_json(self.client.get(self.url("data"))).await
    }

    async fn create_data_entry(&self, entry: &NewDataEntry) -> Result<(), LucinkaError> {
        self.execute_empty(self.client.post(self.url("data")).json(entry))
            .await
    }

    async fn delete_data_entry(&self, entry_id: i64) -> Result<(), LucinkaError> {
        let url = self.url(&format!("data/{entry_id}"));
        self.execute_empty(self.client.delete(url)).await
    }

    async fn get_photos(&self) -> Result<Vec<PhotoRecord>, LucinkaError> {
        self.execute_json(self.client.get(self.url("photos"))).await
    }

    async fn delete_photo(&self, photo_id: i64) -> Result<(), LucinkaError> {
        let url = self.url(&format!("photos/{photo_id}"));
        self.execute_empty(self.client.delete(url)).await
    }

    async fn download_photo(
        &self,
        filename: &str,
        output_path: Option<PathBuf>,
    ) -> Result<Option<String>, LucinkaError> {
        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return Err(LucinkaError::InvalidInput(format!(
                "invalid photo filename: {filename}"
            )));
        }
        self.download_file(self.url(&format!("photos/{filename}")), output_path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_new_and_basic() {
        let client =
            ReqwestLucinkaClient::new("http://localhost/", "mama", SecretString::new("pw".into()));
        assert_eq!(client.url("activities"), "http://localhost/api/activities");
        assert_eq!(client.url("/visits/3"), "http://localhost/api/visits/3");
    }

    #[tokio::test]
    async fn download_photo_rejects_path_traversal() {
        let client =
            ReqwestLucinkaClient::new("http://localhost", "mama", SecretString::new("pw".into()));
        let res = client.download_photo("../secret", None).await;
        assert!(matches!(res, Err(LucinkaError::InvalidInput(_))));
    }
}
