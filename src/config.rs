use clap::Parser;
use url::Url;

use crate::domain::CompressionPreset;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5001";

/// Desktop client for the PPT compression server.
#[derive(Debug, Clone, Parser)]
#[command(name = "ppt-compressor", version, about)]
pub struct Settings {
    /// Base URL of the compression server
    #[arg(long, env = "PPT_COMPRESSOR_SERVER", default_value = DEFAULT_SERVER)]
    pub server: Url,

    /// Preset selected when the window opens
    #[arg(long, value_enum, default_value_t = CompressionPreset::Balanced)]
    pub preset: CompressionPreset,

    /// Log filter, e.g. `info` or `ppt_compressor_client=debug`. Falls back to RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,
}

impl Settings {
    pub fn log_filter(&self) -> tracing_subscriber::EnvFilter {
        match &self.log {
            Some(directives) => tracing_subscriber::EnvFilter::new(directives),
            None => tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        }
    }
}
