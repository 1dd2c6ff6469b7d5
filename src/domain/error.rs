use thiserror::Error;

/// Failures the user is told about. `Display` is the notification text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please choose a PPT or PPTX file")]
    InvalidFileType,

    #[error("{}", .0.as_deref().unwrap_or("Compression failed, please try again"))]
    SubmissionRejected(Option<String>),

    #[error("Network error, please try again")]
    Network,

    #[error("{}", .0.as_deref().unwrap_or("Compression failed"))]
    Compression(Option<String>),

    #[error("Connection lost, please try again")]
    ConnectionLost,

    #[error("Could not read file: {0}")]
    Io(String),

    #[error("Download failed: {0}")]
    Download(String),
}
