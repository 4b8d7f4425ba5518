//! Generation API client.
//!
//! Submits a job to the backend and hands back the raw response body as a
//! [`ByteStream`]. Everything after that (framing, parsing, state) belongs
//! to the [`StreamDriver`](crate::driver::StreamDriver).

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use crate::config::FeedConfig;
use crate::driver::ByteStream;
use crate::error::{classify_reqwest_error, NetworkError, StreamError};
use crate::models::GenerateRequest;

/// Anything that can start a job and return its progress feed.
///
/// # Example
///
/// ```ignore
/// use jobfeed::client::JobSubmitter;
///
/// async fn start<J: JobSubmitter>(submitter: &J, request: &GenerateRequest) {
///     let body = submitter.start(request).await?;
///     StreamDriver::new().run(body, on_update, on_terminal).await;
/// }
/// ```
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submit `request` and return the streaming response body.
    ///
    /// Fails only if no feed could be opened (connect error, non-2xx status).
    async fn start(&self, request: &GenerateRequest) -> Result<ByteStream, NetworkError>;
}

/// Client for the generation backend's streaming endpoint.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    config: FeedConfig,
    client: Client,
}

impl GenerationClient {
    /// Create a client from `config`.
    pub fn new(config: FeedConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| NetworkError::InvalidRequest {
                message: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl JobSubmitter for GenerationClient {
    async fn start(&self, request: &GenerateRequest) -> Result<ByteStream, NetworkError> {
        let url = self.config.stream_url();
        let timeout_secs = self.config.connect_timeout.as_secs();
        tracing::debug!(%url, company = %request.company, role = %request.role, "Submitting job");

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), "Job submission rejected");
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(status = status.as_u16(), "Progress feed opened");
        let body = response.bytes_stream().map(|chunk| chunk.map_err(StreamError::from));
        Ok(Box::pin(body))
    }
}
