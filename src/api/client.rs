use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, ProgressEvent, SubmitResponse};
use super::sse;
use crate::domain::{CompressionPreset, SelectedFile, TaskHandle};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server rejected the submission: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Resolve a server path or absolute URL against the configured base.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Upload the file with its preset. Returns the task handle to stream progress for.
    pub async fn submit(
        &self,
        file: &SelectedFile,
        preset: CompressionPreset,
    ) -> Result<TaskHandle> {
        let content = tokio::fs::read(&file.path).await?;
        let form = Form::new()
            .part("file", Part::bytes(content).file_name(file.name.clone()))
            .text("preset", preset.as_str());

        let response = self
            .http
            .post(self.resolve("compress")?)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        match body.task_id {
            Some(task_id) if status.is_success() && body.success && !task_id.is_empty() => {
                Ok(TaskHandle::new(task_id))
            }
            _ => Err(ApiError::Rejected(body.error)),
        }
    }

    /// Open the progress event stream for a task.
    ///
    /// Each item is one decoded event. Payloads that are not valid JSON are
    /// logged and skipped; transport errors are yielded as `Err`.
    pub async fn progress_stream(
        &self,
        task: &TaskHandle,
    ) -> Result<BoxStream<'static, Result<ProgressEvent>>> {
        let url = self.resolve(&format!("progress/{}", task.as_str()))?;
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let events = sse::data_stream(response.bytes_stream()).filter_map(|payload| {
            let event = match payload {
                Ok(data) => match serde_json::from_str::<ProgressEvent>(&data) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        tracing::warn!(error = %e, payload = %data, "skipping malformed progress event");
                        None
                    }
                },
                Err(e) => Some(Err(e)),
            };
            futures::future::ready(event)
        });

        Ok(events.boxed())
    }

    /// Download a file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &Url,
    ) -> Result<(Option<u64>, BoxStream<'static, Result<bytes::Bytes>>)> {
        let response = self
            .http
            .get(download_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError).boxed();

        Ok((total_size, stream))
    }
}
