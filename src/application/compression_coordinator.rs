use futures::{stream::BoxStream, StreamExt};

use crate::{
    api::{ApiClient, ApiError, ProgressEvent},
    domain::{AppError, CompressionPreset, SelectedFile, TaskHandle},
};

/// What the progress feed reports to the update loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    Event(ProgressEvent),
    /// Could not connect, or the connection ended before a terminal event.
    Failed,
}

#[derive(Clone)]
pub struct CompressionCoordinator {
    api_client: ApiClient,
}

impl CompressionCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// `Ok(None)` when the dialog is cancelled.
    pub async fn pick_file(&self) -> Result<Option<SelectedFile>, AppError> {
        let Some(handle) = rfd::AsyncFileDialog::new()
            .add_filter("PowerPoint", &["ppt", "pptx"])
            .pick_file()
            .await
        else {
            return Ok(None);
        };

        read_selection(handle.path().to_path_buf()).await.map(Some)
    }

    pub async fn submit(
        &self,
        file: SelectedFile,
        preset: CompressionPreset,
    ) -> Result<TaskHandle, AppError> {
        tracing::info!(file = %file.name, size = file.size, preset = preset.as_str(), "submitting");

        match self.api_client.submit(&file, preset).await {
            Ok(task) => {
                tracing::info!(task = %task, "compression task accepted");
                Ok(task)
            }
            Err(ApiError::Rejected(reason)) => {
                tracing::warn!(reason = ?reason, "submission rejected");
                Err(AppError::SubmissionRejected(reason))
            }
            Err(ApiError::Io(e)) => {
                tracing::warn!(error = %e, "could not read upload");
                Err(AppError::Io(e.to_string()))
            }
            Err(e) => {
                // malformed bodies fall in here too; the user sees one network message
                tracing::warn!(error = %e, "submission failed");
                Err(AppError::Network)
            }
        }
    }

    pub fn progress_stream(&self, task: TaskHandle) -> BoxStream<'static, StreamUpdate> {
        futures::stream::unfold(
            FeedState::Connecting {
                client: self.api_client.clone(),
                task,
            },
            |state| async move {
                match state {
                    FeedState::Connecting { client, task } => {
                        match client.progress_stream(&task).await {
                            Ok(events) => next_update(task, events).await,
                            Err(e) => {
                                tracing::warn!(task = %task, error = %e, "progress stream failed to open");
                                Some((StreamUpdate::Failed, FeedState::Finished))
                            }
                        }
                    }
                    FeedState::Streaming { task, events } => next_update(task, events).await,
                    FeedState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

/// Metadata for a file the user chose, as a user-facing error when it can't be read.
pub async fn read_selection(path: std::path::PathBuf) -> Result<SelectedFile, AppError> {
    SelectedFile::from_path(path.clone()).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "could not read selected file");
        AppError::Io(e.to_string())
    })
}

async fn next_update(
    task: TaskHandle,
    mut events: BoxStream<'static, crate::api::Result<ProgressEvent>>,
) -> Option<(StreamUpdate, FeedState)> {
    match events.next().await {
        Some(Ok(event)) => {
            let next = if event.is_terminal() {
                FeedState::Finished
            } else {
                FeedState::Streaming { task, events }
            };
            Some((StreamUpdate::Event(event), next))
        }
        Some(Err(e)) => {
            tracing::warn!(task = %task, error = %e, "progress stream dropped");
            Some((StreamUpdate::Failed, FeedState::Finished))
        }
        None => {
            tracing::warn!(task = %task, "progress stream ended without a result");
            Some((StreamUpdate::Failed, FeedState::Finished))
        }
    }
}

enum FeedState {
    Connecting {
        client: ApiClient,
        task: TaskHandle,
    },
    Streaming {
        task: TaskHandle,
        events: BoxStream<'static, crate::api::Result<ProgressEvent>>,
    },
    Finished,
}
