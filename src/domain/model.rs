use std::fmt;
use std::path::PathBuf;

/// A presentation the user picked or dropped, waiting to be compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    /// Where the bytes are read from when the file is submitted.
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            path: path.into(),
        }
    }

    pub async fn from_path(path: PathBuf) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            path,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CompressionPreset {
    Lossless,
    High,
    #[default]
    Balanced,
    Aggressive,
    Small,
    Mini,
}

impl CompressionPreset {
    pub const ALL: [CompressionPreset; 6] = [
        CompressionPreset::Lossless,
        CompressionPreset::High,
        CompressionPreset::Balanced,
        CompressionPreset::Aggressive,
        CompressionPreset::Small,
        CompressionPreset::Mini,
    ];

    /// Value sent in the `preset` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionPreset::Lossless => "lossless",
            CompressionPreset::High => "high",
            CompressionPreset::Balanced => "balanced",
            CompressionPreset::Aggressive => "aggressive",
            CompressionPreset::Small => "small",
            CompressionPreset::Mini => "mini",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompressionPreset::Lossless => "Lossless",
            CompressionPreset::High => "High quality",
            CompressionPreset::Balanced => "Balanced",
            CompressionPreset::Aggressive => "Aggressive",
            CompressionPreset::Small => "Small",
            CompressionPreset::Mini => "Mini",
        }
    }
}

impl fmt::Display for CompressionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server-issued identifier tying a submission to its progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Figures shown in the result overlay. Sizes arrive preformatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionResult {
    pub original_size: String,
    pub compressed_size: String,
    pub reduction: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    FileSelected,
    Compressing,
    ResultShown,
}
