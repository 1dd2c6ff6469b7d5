use std::path::PathBuf;

use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::{event, task, window, Event, Subscription, Task};
use url::Url;

use crate::api::{ApiClient, ApiConfig};
use crate::application::{
    read_selection, Command, CompressionCoordinator, ControllerEvent, DownloadCoordinator,
    DownloadEvent, StreamUpdate, UploadController,
};
use crate::config::Settings;
use crate::domain::{AppError, SelectedFile, TaskHandle};
use crate::ui::{DownloadStatus, UploadMessage, UploadView};
use crate::utils::is_presentation;

pub struct CompressorApp {
    controller: UploadController<UploadView>,
    compression: CompressionCoordinator,
    downloads: DownloadCoordinator,
    /// The single progress stream task, if one is running.
    open_stream: Option<(TaskHandle, task::Handle)>,
    /// Set while files hover the window; the first drop of the gesture disarms it.
    drop_armed: bool,
}

/// How a file dropped on the window is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DropAction {
    /// Not a presentation by name; the controller rejects it without touching the disk.
    Rejected(SelectedFile),
    Read(PathBuf),
}

impl CompressorApp {
    pub fn new(settings: Settings) -> Self {
        let api_client = ApiClient::new(ApiConfig::new(settings.server));
        let view = UploadView::new(settings.preset);

        Self {
            controller: UploadController::new(view),
            compression: CompressionCoordinator::new(api_client.clone()),
            downloads: DownloadCoordinator::new(api_client),
            open_stream: None,
            drop_armed: false,
        }
    }

    /// Only the first file of a drop gesture is considered.
    fn accept_drop(&mut self, path: PathBuf) -> Option<DropAction> {
        if !std::mem::take(&mut self.drop_armed) {
            tracing::debug!(path = %path.display(), "ignoring extra dropped file");
            return None;
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if is_presentation(&name) {
            Some(DropAction::Read(path))
        } else {
            Some(DropAction::Rejected(SelectedFile::new(name, 0, path)))
        }
    }

    fn dispatch(&mut self, event: ControllerEvent) -> Task<Message> {
        let commands = self.controller.handle(event);
        let mut tasks: Vec<Task<Message>> = commands
            .into_iter()
            .map(|command| self.run(command))
            .collect();

        tasks.extend(
            self.controller
                .surface_mut()
                .take_notices()
                .into_iter()
                .map(|notice| Task::perform(show_notice(notice), |_| Message::NoticeDismissed)),
        );

        Task::batch(tasks)
    }

    fn run(&mut self, command: Command) -> Task<Message> {
        match command {
            Command::OpenFilePicker => {
                let coordinator = self.compression.clone();
                Task::perform(
                    async move { coordinator.pick_file().await },
                    Message::FilePicked,
                )
            }
            Command::Submit { file, preset } => {
                let coordinator = self.compression.clone();
                Task::perform(
                    async move { coordinator.submit(file, preset).await },
                    Message::Submitted,
                )
            }
            Command::OpenStream(task) => {
                if let Some((stale, handle)) = self.open_stream.take() {
                    tracing::warn!(task = %stale, "replacing a progress stream that was never closed");
                    handle.abort();
                }

                let feed = self.compression.progress_stream(task.clone());
                let id = task.clone();
                let (stream, handle) =
                    Task::run(feed, move |update| Message::Stream(id.clone(), update)).abortable();

                tracing::debug!(task = %task, "progress stream opened");
                self.open_stream = Some((task, handle));
                stream
            }
            Command::CloseStream(task) => {
                match self.open_stream.take() {
                    Some((open, handle)) if open == task => {
                        tracing::debug!(task = %task, "progress stream closed");
                        handle.abort();
                    }
                    other => self.open_stream = other,
                }
                Task::none()
            }
        }
    }

    #[cfg(test)]
    fn controller(&self) -> &UploadController<UploadView> {
        &self.controller
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Ui(UploadMessage),
    Shortcut(Shortcut),
    FileHovered(bool),
    FileDropped(PathBuf),
    DroppedFileRead(Result<SelectedFile, AppError>),
    FilePicked(Result<Option<SelectedFile>, AppError>),
    Submitted(Result<TaskHandle, AppError>),
    Stream(TaskHandle, StreamUpdate),
    NoticeDismissed,
    /// (Resolved download URL, chosen destination)
    SavePathChosen(Url, Option<PathBuf>),
    Download(DownloadEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    OpenFile,
    Dismiss,
}

/// Platform modifier + O opens the picker, Escape dismisses the result.
pub fn shortcut(key: &Key, modifiers: Modifiers) -> Option<Shortcut> {
    match key {
        Key::Named(Named::Escape) => Some(Shortcut::Dismiss),
        Key::Character(c) if modifiers.command() && c.as_str() == "o" => Some(Shortcut::OpenFile),
        _ => None,
    }
}

pub fn update(app: &mut CompressorApp, message: Message) -> Task<Message> {
    match message {
        Message::Ui(ui_msg) => match ui_msg {
            UploadMessage::DropZonePressed => app.dispatch(ControllerEvent::DropZoneClicked),
            UploadMessage::RemoveFilePressed => app.dispatch(ControllerEvent::RemoveFile),
            UploadMessage::PresetSelected(preset) => {
                app.controller.surface_mut().preset = preset;
                Task::none()
            }
            UploadMessage::CompressPressed => {
                let preset = app.controller.surface().preset;
                app.dispatch(ControllerEvent::Compress(preset))
            }
            UploadMessage::CompressAnotherPressed | UploadMessage::BackdropPressed => {
                app.dispatch(ControllerEvent::DismissResult)
            }
            UploadMessage::DownloadPressed => {
                let Some(result) = app.controller.surface().result() else {
                    return Task::none();
                };

                match app.downloads.resolve(&result.download_url) {
                    Ok(url) => {
                        let coordinator = app.downloads.clone();
                        Task::perform(
                            async move {
                                let path = coordinator.choose_save_path(&url).await;
                                (url, path)
                            },
                            |(url, path)| Message::SavePathChosen(url, path),
                        )
                    }
                    Err(e) => {
                        app.controller.surface_mut().download = DownloadStatus::Failed(e.to_string());
                        Task::none()
                    }
                }
            }
        },
        Message::Shortcut(Shortcut::OpenFile) => app.dispatch(ControllerEvent::OpenShortcut),
        Message::Shortcut(Shortcut::Dismiss) => app.dispatch(ControllerEvent::DismissResult),
        Message::FileHovered(hovering) => {
            app.controller.surface_mut().drag_hover = hovering;
            app.drop_armed = hovering;
            Task::none()
        }
        Message::FileDropped(path) => {
            app.controller.surface_mut().drag_hover = false;
            match app.accept_drop(path) {
                Some(DropAction::Rejected(file)) => app.dispatch(ControllerEvent::FileDropped(file)),
                Some(DropAction::Read(path)) => {
                    Task::perform(read_selection(path), Message::DroppedFileRead)
                }
                None => Task::none(),
            }
        }
        Message::DroppedFileRead(Ok(file)) => app.dispatch(ControllerEvent::FileDropped(file)),
        Message::DroppedFileRead(Err(e)) | Message::FilePicked(Err(e)) => {
            Task::perform(show_notice(e.to_string()), |_| Message::NoticeDismissed)
        }
        Message::FilePicked(Ok(Some(file))) => app.dispatch(ControllerEvent::FilePicked(file)),
        Message::FilePicked(Ok(None)) => Task::none(),
        Message::Submitted(Ok(task)) => app.dispatch(ControllerEvent::SubmitAccepted(task)),
        Message::Submitted(Err(e)) => app.dispatch(ControllerEvent::SubmitFailed(e)),
        Message::Stream(task, StreamUpdate::Event(event)) => {
            app.dispatch(ControllerEvent::Stream(task, event))
        }
        Message::Stream(task, StreamUpdate::Failed) => {
            app.dispatch(ControllerEvent::StreamFailed(task))
        }
        Message::NoticeDismissed => Task::none(),
        Message::SavePathChosen(url, Some(path)) => {
            app.controller.surface_mut().download = DownloadStatus::InProgress(0.0);
            Task::run(app.downloads.download_stream(url, path), Message::Download)
        }
        Message::SavePathChosen(_, None) => Task::none(),
        Message::Download(event) => {
            let status = match event {
                DownloadEvent::Progress(fraction) => DownloadStatus::InProgress(fraction),
                DownloadEvent::Completed(path) => {
                    tracing::info!(path = %path.display(), "download saved");
                    DownloadStatus::Saved(path.display().to_string())
                }
                DownloadEvent::Failed(e) => {
                    tracing::warn!(error = %e, "download failed");
                    DownloadStatus::Failed(e.to_string())
                }
            };
            app.controller.surface_mut().download = status;
            Task::none()
        }
    }
}

pub fn view(app: &CompressorApp) -> iced::Element<'_, Message> {
    app.controller.surface().view().map(Message::Ui)
}

pub fn subscription(_app: &CompressorApp) -> Subscription<Message> {
    event::listen_with(window_event)
}

fn window_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            shortcut(&key, modifiers).map(Message::Shortcut)
        }
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered(true)),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHovered(false)),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        _ => None,
    }
}

async fn show_notice(message: String) {
    rfd::AsyncMessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("PPT Compressor")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show()
        .await;
}
