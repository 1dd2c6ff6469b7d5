mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use clap::Parser;
use iced::{window, Size};

fn main() -> iced::Result {
    let settings = config::Settings::parse();

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter())
        .init();
    tracing::info!(server = %settings.server, preset = settings.preset.as_str(), "starting");

    iced::application(
        move || app::CompressorApp::new(settings.clone()),
        app::update,
        app::view,
    )
    .title("PPT Compressor")
    .subscription(app::subscription)
    .window(window::Settings {
        size: Size::new(560.0, 720.0),
        ..Default::default()
    })
    .run()
}
