use std::path::{Path, PathBuf};

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{
    api::{ApiClient, ApiError},
    domain::AppError,
    utils::suggested_filename,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Fraction written so far; stays at 0.0 when the size is unknown.
    Progress(f32),
    Completed(PathBuf),
    Failed(AppError),
}

/// Fetches the compressed presentation the result overlay links to.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub fn resolve(&self, download_url: &str) -> Result<Url, AppError> {
        self.api_client
            .resolve(download_url)
            .map_err(|e| AppError::Download(e.to_string()))
    }

    pub async fn choose_save_path(&self, url: &Url) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(suggested_filename(url))
            .add_filter("PowerPoint", &["ppt", "pptx"])
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Stream the download into `path`.
    ///
    /// Bytes land in a `.part` file next to `path`, which replaces `path`
    /// only once the whole body is on disk. A failed download leaves `path`
    /// as it was.
    pub fn download_stream(&self, url: Url, path: PathBuf) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(
            TransferState::Start {
                client: self.api_client.clone(),
                url,
                path,
            },
            |state| async move {
                match state {
                    TransferState::Start { client, url, path } => {
                        tracing::info!(%url, path = %path.display(), "downloading result");
                        let (total, body) = match client.download_file_stream(&url).await {
                            Ok(response) => response,
                            Err(e) => {
                                return Some((
                                    DownloadEvent::Failed(download_failed(e)),
                                    TransferState::Finished,
                                ));
                            }
                        };

                        let part = part_path(&path);
                        let file = match tokio::fs::File::create(&part).await {
                            Ok(file) => file,
                            Err(e) => {
                                tracing::warn!(path = %part.display(), error = %e, "could not create download file");
                                return Some((
                                    DownloadEvent::Failed(AppError::Io(e.to_string())),
                                    TransferState::Finished,
                                ));
                            }
                        };

                        Some((
                            DownloadEvent::Progress(0.0),
                            TransferState::Receiving {
                                file,
                                body,
                                written: 0,
                                total,
                                part,
                                path,
                            },
                        ))
                    }
                    TransferState::Receiving {
                        mut file,
                        mut body,
                        mut written,
                        total,
                        part,
                        path,
                    } => match body.next().await {
                        Some(Ok(chunk)) => {
                            if let Err(e) = file.write_all(&chunk).await {
                                discard(file, &part).await;
                                return Some((
                                    DownloadEvent::Failed(AppError::Io(e.to_string())),
                                    TransferState::Finished,
                                ));
                            }
                            written += chunk.len() as u64;

                            Some((
                                DownloadEvent::Progress(fraction(written, total)),
                                TransferState::Receiving {
                                    file,
                                    body,
                                    written,
                                    total,
                                    part,
                                    path,
                                },
                            ))
                        }
                        Some(Err(e)) => {
                            discard(file, &part).await;
                            Some((
                                DownloadEvent::Failed(download_failed(e)),
                                TransferState::Finished,
                            ))
                        }
                        None => {
                            let finished = match file.sync_all().await {
                                Ok(()) => {
                                    drop(file);
                                    tokio::fs::rename(&part, &path).await
                                }
                                Err(e) => {
                                    drop(file);
                                    Err(e)
                                }
                            };

                            match finished {
                                Ok(()) => {
                                    Some((DownloadEvent::Completed(path), TransferState::Finished))
                                }
                                Err(e) => {
                                    let _ = tokio::fs::remove_file(&part).await;
                                    Some((
                                        DownloadEvent::Failed(AppError::Io(e.to_string())),
                                        TransferState::Finished,
                                    ))
                                }
                            }
                        }
                    },
                    TransferState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

/// `deck.pptx` -> `deck.pptx.part`
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn discard(file: tokio::fs::File, part: &Path) {
    drop(file);
    if let Err(e) = tokio::fs::remove_file(part).await {
        tracing::warn!(path = %part.display(), error = %e, "could not remove partial download");
    }
}

/// Short overlay text; the full error goes to the log.
fn download_failed(error: ApiError) -> AppError {
    tracing::warn!(%error, "download request failed");
    let reason = match &error {
        ApiError::RequestError(e) => match e.status() {
            Some(status) => format!("server responded {}", status),
            None => "connection interrupted".to_string(),
        },
        _ => "unexpected server response".to_string(),
    };
    AppError::Download(reason)
}

fn fraction(written: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => (written as f32 / total as f32).min(1.0),
        _ => 0.0,
    }
}

enum TransferState {
    Start {
        client: ApiClient,
        url: Url,
        path: PathBuf,
    },
    Receiving {
        file: tokio::fs::File,
        body: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
        written: u64,
        total: Option<u64>,
        part: PathBuf,
        path: PathBuf,
    },
    Finished,
}
