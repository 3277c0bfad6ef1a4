//! Profile API client — the single point of entry for all backend calls.
//!
//! No other module talks to the network directly: the executor, the poller
//! and the service all go through the `ProfileApi` trait. `HttpProfileApi`
//! is the real reqwest-backed implementation; `InMemoryProfileApi` backs
//! the tests with the same contract.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::profile::{FullProfile, RemoteRecord};
use crate::reconcile::sections::Collection;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// 401/403-class failure at any stage. Aborts an entire sync pass and
    /// surfaces as "please sign in again".
    #[error("session expired, please sign in again")]
    AuthExpired,

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Wire shape of `GET /profiles/{slug}/parsing-status/?include_resume=true`.
/// Everything beyond `parsing_status` is extractable resume data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsingStatus {
    #[serde(default)]
    pub parsing_status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The remote collection and resume-parsing API.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn create_record(
        &self,
        collection: Collection,
        payload: &Value,
    ) -> Result<RemoteRecord, ApiError>;

    async fn update_record(
        &self,
        collection: Collection,
        id: i64,
        payload: &Value,
    ) -> Result<(), ApiError>;

    async fn delete_record(&self, collection: Collection, id: i64) -> Result<(), ApiError>;

    /// The authoritative full profile, including `verified_profile`.
    async fn full_profile(&self, slug: &str) -> Result<FullProfile, ApiError>;

    async fn trigger_resume_parse(&self, slug: &str) -> Result<(), ApiError>;

    async fn parsing_status(&self, slug: &str) -> Result<ParsingStatus, ApiError>;
}

/// DRF-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: String,
}

/// The reqwest-backed client.
#[derive(Clone)]
pub struct HttpProfileApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpProfileApi {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Maps a response to `ApiError` unless it succeeded. 401/403 become
    /// `AuthExpired`; other failures carry the backend's `detail` message
    /// when one is present.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthExpired);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn create_record(
        &self,
        collection: Collection,
        payload: &Value,
    ) -> Result<RemoteRecord, ApiError> {
        debug!(%collection, "creating record");
        let response = self
            .client
            .post(self.url(&format!("{}/", collection.api_path())))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;
        let record = Self::check(response).await?.json::<RemoteRecord>().await?;
        Ok(record)
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: i64,
        payload: &Value,
    ) -> Result<(), ApiError> {
        debug!(%collection, id, "updating record");
        let response = self
            .client
            .patch(self.url(&format!("{}/{}/", collection.api_path(), id)))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: i64) -> Result<(), ApiError> {
        debug!(%collection, id, "deleting record");
        let response = self
            .client
            .delete(self.url(&format!("{}/{}/", collection.api_path(), id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn full_profile(&self, slug: &str) -> Result<FullProfile, ApiError> {
        debug!(slug, "fetching full profile");
        let response = self
            .client
            .get(self.url(&format!("profiles/{slug}/full/")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let full = Self::check(response).await?.json::<FullProfile>().await?;
        Ok(full)
    }

    async fn trigger_resume_parse(&self, slug: &str) -> Result<(), ApiError> {
        debug!(slug, "triggering resume parse");
        let response = self
            .client
            .post(self.url(&format!("profiles/{slug}/parse-resume/")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn parsing_status(&self, slug: &str) -> Result<ParsingStatus, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("profiles/{slug}/parsing-status/")))
            .query(&[("include_resume", "true")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = Self::check(response)
            .await?
            .json::<ParsingStatus>()
            .await?;
        Ok(status)
    }
}

#[cfg(test)]
pub mod fake;
#[cfg(test)]
pub use fake::InMemoryProfileApi;
