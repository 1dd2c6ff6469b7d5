use serde::Deserialize;

/// Response from the /compress endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One message on the /progress/{task_id} event stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress {
        percent: u8,
        #[serde(default)]
        message: String,
    },
    Completed {
        original_size: String,
        compressed_size: String,
        reduction: String,
        download_url: String,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    /// Heartbeats and anything else the server may add later.
    #[serde(other)]
    Other,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Error { .. }
        )
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: url::Url,
}

impl ApiConfig {
    pub fn new(base_url: url::Url) -> Self {
        Self { base_url }
    }
}
