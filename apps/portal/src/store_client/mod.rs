/// Store client: the single point of entry for every HTTP call the portal makes.
///
/// The recommendation pipeline and the session only see the `RecommendationApi`
/// and `CandidateStore` traits; `PortalClient` is the reqwest-backed implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::candidate::{CandidateDraft, CandidateRecord};
use crate::models::job::{JobPosting, JobPostingDraft};
use crate::models::recommendation::{error_message_from_body, TaskHandle, TaskStatusResponse};

/// Fallback when a rejected submission carries no readable error.
pub const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to start recommendation";

/// Remote evaluator endpoints.
#[async_trait]
pub trait RecommendationApi: Send + Sync {
    async fn submit_recommendation(&self, job_id: &str) -> Result<TaskHandle, ClientError>;

    async fn recommendation_status(&self, task_id: &str)
        -> Result<TaskStatusResponse, ClientError>;
}

/// Candidate and job posting endpoints consumed by the session cache.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, ClientError>;

    async fn create_candidate(&self, draft: &CandidateDraft) -> Result<(), ClientError>;

    async fn update_candidate(
        &self,
        record_id: &str,
        draft: &CandidateDraft,
    ) -> Result<(), ClientError>;

    async fn delete_candidate(&self, record_id: &str) -> Result<(), ClientError>;

    async fn list_job_postings(&self) -> Result<Vec<JobPosting>, ClientError>;
}

#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: Url,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| ClientError::Transport(format!("invalid API root {raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!("invalid API root {raw}")));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the API root, percent-encoding each one so ids
    /// containing `/`, `?` or `#` stay inside their own path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends the request and maps non-success statuses to `RequestRejected`.
    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Store returned {}: {}", status, body);
        let message = error_message_from_body(&body).unwrap_or_else(|| fallback.to_string());
        Err(ClientError::RequestRejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Reads the body as text first so decode failures are reported as malformed responses.
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_candidate(&self, record_id: &str) -> Result<CandidateRecord, ClientError> {
        let request = self.client.get(self.url(&["candidates", record_id]));
        let response = self.send(request, "Candidate not found").await?;
        Self::json(response).await
    }

    pub async fn create_job_posting(&self, draft: &JobPostingDraft) -> Result<(), ClientError> {
        let request = self.client.post(self.url(&["job_postings"])).json(draft);
        self.send(request, "Failed to save job posting").await?;
        Ok(())
    }

    pub async fn update_job_posting(
        &self,
        job_id: &str,
        draft: &JobPostingDraft,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .put(self.url(&["job_postings", job_id]))
            .json(draft);
        self.send(request, "Failed to save job posting").await?;
        Ok(())
    }

    pub async fn delete_job_posting(&self, job_id: &str) -> Result<(), ClientError> {
        let request = self.client.delete(self.url(&["job_postings", job_id]));
        self.send(request, "Failed to delete job posting").await?;
        Ok(())
    }
}

#[async_trait]
impl RecommendationApi for PortalClient {
    async fn submit_recommendation(&self, job_id: &str) -> Result<TaskHandle, ClientError> {
        let request = self
            .client
            .post(self.url(&["recommendations", job_id]));
        let response = self.send(request, SUBMIT_FALLBACK_MESSAGE).await?;
        let handle: TaskHandle = Self::json(response).await?;
        debug!("Recommendation task {} submitted for job {}", handle.task_id, job_id);
        Ok(handle)
    }

    async fn recommendation_status(
        &self,
        task_id: &str,
    ) -> Result<TaskStatusResponse, ClientError> {
        let request = self
            .client
            .get(self.url(&["recommendations", "status", task_id]));
        let response = self.send(request, "Failed to read task status").await?;
        Self::json(response).await
    }
}

#[async_trait]
impl CandidateStore for PortalClient {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, ClientError> {
        let request = self.client.get(self.url(&["candidates"]));
        let response = self.send(request, "Failed to fetch candidates").await?;
        Self::json(response).await
    }

    async fn create_candidate(&self, draft: &CandidateDraft) -> Result<(), ClientError> {
        let request = self.client.post(self.url(&["candidates"])).json(draft);
        self.send(request, "Failed to save candidate").await?;
        Ok(())
    }

    async fn update_candidate(
        &self,
        record_id: &str,
        draft: &CandidateDraft,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .put(self.url(&["candidates", record_id]))
            .json(draft);
        self.send(request, "Failed to save candidate").await?;
        Ok(())
    }

    async fn delete_candidate(&self, record_id: &str) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&["candidates", record_id]));
        self.send(request, "Failed to delete candidate").await?;
        Ok(())
    }

    async fn list_job_postings(&self) -> Result<Vec<JobPosting>, ClientError> {
        let request = self.client.get(self.url(&["job_postings"]));
        let response = self.send(request, "Failed to fetch job postings").await?;
        Self::json(response).await
    }
}
