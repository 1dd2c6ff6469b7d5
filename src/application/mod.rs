pub mod compression_coordinator;
pub mod controller;
pub mod download_coordinator;

pub use compression_coordinator::{read_selection, CompressionCoordinator, StreamUpdate};
pub use controller::{Command, ControllerEvent, UploadController};
pub use download_coordinator::{DownloadCoordinator, DownloadEvent};
