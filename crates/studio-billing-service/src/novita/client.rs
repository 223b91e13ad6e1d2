//! Novita API client implementation.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    CreateTaskResponse, KlingVideoRequest, MergeFaceRequest, MergeFaceResponse, SeedreamRequest,
    SeedreamResponse, TaskResultResponse,
};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for async task submissions.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for task-result polls.
const POLL_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout for synchronous generation calls (t2i, face-merge).
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Error type for Novita operations.
#[derive(Debug, thiserror::Error)]
pub enum NovitaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Novita returned a non-success status.
    #[error("Novita API error: {status} - {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        detail: String,
    },
}

/// Novita API client.
#[derive(Debug, Clone)]
pub struct NovitaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NovitaClient {
    /// Create a new Novita client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, NovitaError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Submit a Kling text-to-video task.
    pub async fn submit_t2v(
        &self,
        request: &KlingVideoRequest,
    ) -> Result<CreateTaskResponse, NovitaError> {
        self.post_json("/v3/async/kling-2.5-turbo-t2v", request, SUBMIT_TIMEOUT)
            .await
    }

    /// Submit a Kling image-to-video task.
    pub async fn submit_i2v(
        &self,
        request: &KlingVideoRequest,
    ) -> Result<CreateTaskResponse, NovitaError> {
        self.post_json("/v3/async/kling-2.5-turbo-i2v", request, SUBMIT_TIMEOUT)
            .await
    }

    /// Poll an async task by id.
    pub async fn task_result(&self, task_id: &str) -> Result<TaskResultResponse, NovitaError> {
        let url = format!("{}/v3/async/task-result", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("task_id", task_id)])
            .bearer_auth(&self.api_key)
            .timeout(POLL_TIMEOUT)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Generate images synchronously with Seedream.
    pub async fn text_to_image(
        &self,
        request: &SeedreamRequest,
    ) -> Result<SeedreamResponse, NovitaError> {
        self.post_json("/v3/seedream-3-0-txt2img", request, SYNC_TIMEOUT)
            .await
    }

    /// Merge a face into a target image synchronously.
    pub async fn merge_face(
        &self,
        request: &MergeFaceRequest,
    ) -> Result<MergeFaceResponse, NovitaError> {
        self.post_json("/v3/merge-face", request, SYNC_TIMEOUT).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, NovitaError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, NovitaError> {
        let status = response.status();

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.chars().take(512).collect();
            return Err(NovitaError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.json().await?)
    }
}
