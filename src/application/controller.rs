//! Upload workflow state machine.
//!
//! [`transition`] is a pure function from the current [`Session`] and an
//! incoming [`ControllerEvent`] to the next session plus the effects to
//! perform. [`UploadController`] owns a session, applies view effects to its
//! injected [`UploadSurface`] and hands the rest back to the runtime as
//! [`Command`]s.

use crate::api::ProgressEvent;
use crate::domain::{
    AppError, CompressionPreset, CompressionResult, SelectedFile, TaskHandle, UiState,
};
use crate::utils::{format_size, is_presentation};

pub const PREPARING_MESSAGE: &str = "Preparing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Click on the empty drop zone.
    DropZoneClicked,
    /// Platform modifier + O.
    OpenShortcut,
    FilePicked(SelectedFile),
    FileDropped(SelectedFile),
    RemoveFile,
    Compress(CompressionPreset),
    SubmitAccepted(TaskHandle),
    SubmitFailed(AppError),
    Stream(TaskHandle, ProgressEvent),
    /// The stream could not be opened or dropped before a terminal event.
    StreamFailed(TaskHandle),
    /// "Compress another", Escape, or a click outside the result card.
    DismissResult,
}

/// Controller state together with the data each state owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    FileSelected {
        file: SelectedFile,
    },
    Compressing {
        file: SelectedFile,
        /// `None` until the submission returns a task handle.
        stream: Option<TaskHandle>,
    },
    ResultShown {
        result: CompressionResult,
    },
}

impl Session {
    pub fn ui_state(&self) -> UiState {
        match self {
            Session::Idle => UiState::Idle,
            Session::FileSelected { .. } => UiState::FileSelected,
            Session::Compressing { .. } => UiState::Compressing,
            Session::ResultShown { .. } => UiState::ResultShown,
        }
    }

    #[cfg(test)]
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match self {
            Session::FileSelected { file } | Session::Compressing { file, .. } => Some(file),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn open_stream(&self) -> Option<&TaskHandle> {
        match self {
            Session::Compressing { stream, .. } => stream.as_ref(),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn compress_enabled(&self) -> bool {
        matches!(self, Session::FileSelected { .. })
    }
}

/// Visible changes the controller asks its surface to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    ShowFile { name: String, size: String },
    ClearFile,
    SetCompressEnabled(bool),
    /// Show the progress panel reset to 0% with the preparing message.
    ShowProgress,
    UpdateProgress { percent: u8, message: String },
    HideProgress,
    ShowResult(CompressionResult),
    HideResult,
    Notify(AppError),
}

/// Work only the runtime can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenFilePicker,
    Submit {
        file: SelectedFile,
        preset: CompressionPreset,
    },
    OpenStream(TaskHandle),
    CloseStream(TaskHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    View(ViewChange),
    Run(Command),
}

pub fn transition(session: Session, event: ControllerEvent) -> (Session, Vec<Effect>) {
    use ControllerEvent as E;

    match (session, event) {
        (session @ Session::Idle, E::DropZoneClicked)
        | (session @ (Session::Idle | Session::FileSelected { .. }), E::OpenShortcut) => {
            (session, vec![Effect::Run(Command::OpenFilePicker)])
        }

        (Session::Idle | Session::FileSelected { .. }, E::FilePicked(file)) => select(file),

        (session @ (Session::Idle | Session::FileSelected { .. }), E::FileDropped(file)) => {
            if is_presentation(&file.name) {
                select(file)
            } else {
                (
                    session,
                    vec![Effect::View(ViewChange::Notify(AppError::InvalidFileType))],
                )
            }
        }

        (Session::FileSelected { .. }, E::RemoveFile) => (Session::Idle, reset_effects()),

        (Session::FileSelected { file }, E::Compress(preset)) => (
            Session::Compressing {
                file: file.clone(),
                stream: None,
            },
            vec![
                Effect::View(ViewChange::SetCompressEnabled(false)),
                Effect::View(ViewChange::ShowProgress),
                Effect::Run(Command::Submit { file, preset }),
            ],
        ),

        (Session::Compressing { file, stream: None }, E::SubmitAccepted(task)) => (
            Session::Compressing {
                file,
                stream: Some(task.clone()),
            },
            vec![Effect::Run(Command::OpenStream(task))],
        ),

        (Session::Compressing { file, stream: None }, E::SubmitFailed(error)) => {
            recover(file, None, error)
        }

        (
            Session::Compressing {
                file,
                stream: Some(open),
            },
            E::Stream(task, event),
        ) if task == open => match event {
            ProgressEvent::Progress { percent, message } => (
                Session::Compressing {
                    file,
                    stream: Some(open),
                },
                vec![Effect::View(ViewChange::UpdateProgress {
                    percent: percent.min(100),
                    message,
                })],
            ),
            ProgressEvent::Completed {
                original_size,
                compressed_size,
                reduction,
                download_url,
            } => {
                let result = CompressionResult {
                    original_size,
                    compressed_size,
                    reduction,
                    download_url,
                };
                (
                    Session::ResultShown {
                        result: result.clone(),
                    },
                    vec![
                        Effect::Run(Command::CloseStream(open)),
                        Effect::View(ViewChange::HideProgress),
                        Effect::View(ViewChange::ShowResult(result)),
                    ],
                )
            }
            ProgressEvent::Error { message } => {
                recover(file, Some(open), AppError::Compression(message))
            }
            ProgressEvent::Other => (
                Session::Compressing {
                    file,
                    stream: Some(open),
                },
                Vec::new(),
            ),
        },

        (
            Session::Compressing {
                file,
                stream: Some(open),
            },
            E::StreamFailed(task),
        ) if task == open => recover(file, Some(open), AppError::ConnectionLost),

        (Session::ResultShown { .. }, E::DismissResult) => {
            let mut effects = vec![Effect::View(ViewChange::HideResult)];
            effects.extend(reset_effects());
            (Session::Idle, effects)
        }

        (session, event) => {
            tracing::debug!(state = ?session.ui_state(), ?event, "event ignored");
            (session, Vec::new())
        }
    }
}

fn select(file: SelectedFile) -> (Session, Vec<Effect>) {
    let effects = vec![
        Effect::View(ViewChange::ShowFile {
            name: file.name.clone(),
            size: format_size(file.size),
        }),
        Effect::View(ViewChange::SetCompressEnabled(true)),
    ];
    (Session::FileSelected { file }, effects)
}

fn reset_effects() -> Vec<Effect> {
    vec![
        Effect::View(ViewChange::ClearFile),
        Effect::View(ViewChange::SetCompressEnabled(false)),
    ]
}

/// Back to FileSelected with the same file after any failure while compressing.
fn recover(
    file: SelectedFile,
    open: Option<TaskHandle>,
    error: AppError,
) -> (Session, Vec<Effect>) {
    let mut effects = Vec::with_capacity(4);
    if let Some(task) = open {
        effects.push(Effect::Run(Command::CloseStream(task)));
    }
    effects.extend([
        Effect::View(ViewChange::HideProgress),
        Effect::View(ViewChange::Notify(error)),
        Effect::View(ViewChange::SetCompressEnabled(true)),
    ]);
    (Session::FileSelected { file }, effects)
}

/// UI handle the controller writes to.
pub trait UploadSurface {
    fn show_file(&mut self, name: &str, size: &str);
    fn clear_file(&mut self);
    fn set_compress_enabled(&mut self, enabled: bool);
    fn show_progress(&mut self, percent: u8, message: &str);
    fn update_progress(&mut self, percent: u8, message: &str);
    fn hide_progress(&mut self);
    fn show_result(&mut self, result: &CompressionResult);
    fn hide_result(&mut self);
    fn notify(&mut self, message: &str);
}

pub struct UploadController<S> {
    session: Session,
    surface: S,
}

impl<S: UploadSurface> UploadController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            session: Session::Idle,
            surface,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> UiState {
        self.session.ui_state()
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Feed one event; returns the commands the runtime must carry out.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Command> {
        let before = self.session.ui_state();
        let (session, effects) = transition(std::mem::take(&mut self.session), event);
        self.session = session;

        let after = self.session.ui_state();
        if before != after {
            tracing::debug!(from = ?before, to = ?after, "upload state changed");
        }

        let mut commands = Vec::new();
        for effect in effects {
            match effect {
                Effect::View(change) => self.apply(change),
                Effect::Run(command) => commands.push(command),
            }
        }
        commands
    }

    fn apply(&mut self, change: ViewChange) {
        match change {
            ViewChange::ShowFile { name, size } => self.surface.show_file(&name, &size),
            ViewChange::ClearFile => self.surface.clear_file(),
            ViewChange::SetCompressEnabled(enabled) => self.surface.set_compress_enabled(enabled),
            ViewChange::ShowProgress => self.surface.show_progress(0, PREPARING_MESSAGE),
            ViewChange::UpdateProgress { percent, message } => {
                self.surface.update_progress(percent, &message)
            }
            ViewChange::HideProgress => self.surface.hide_progress(),
            ViewChange::ShowResult(result) => self.surface.show_result(&result),
            ViewChange::HideResult => self.surface.hide_result(),
            ViewChange::Notify(error) => {
                tracing::warn!(%error, "notifying user");
                self.surface.notify(&error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        file: Option<(String, String)>,
        compress_enabled: bool,
        progress: Option<(u8, String)>,
        result: Option<CompressionResult>,
        notices: Vec<String>,
    }

    impl UploadSurface for RecordingSurface {
        fn show_file(&mut self, name: &str, size: &str) {
            self.file = Some((name.to_string(), size.to_string()));
        }
        fn clear_file(&mut self) {
            self.file = None;
        }
        fn set_compress_enabled(&mut self, enabled: bool) {
            self.compress_enabled = enabled;
        }
        fn show_progress(&mut self, percent: u8, message: &str) {
            self.progress = Some((percent, message.to_string()));
        }
        fn update_progress(&mut self, percent: u8, message: &str) {
            self.progress = Some((percent, message.to_string()));
        }
        fn hide_progress(&mut self) {
            self.progress = None;
        }
        fn show_result(&mut self, result: &CompressionResult) {
            self.result = Some(result.clone());
        }
        fn hide_result(&mut self) {
            self.result = None;
        }
        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    fn deck() -> SelectedFile {
        SelectedFile::new("deck.pptx", 2_097_152, "/tmp/deck.pptx")
    }

    fn completed() -> ProgressEvent {
        ProgressEvent::Completed {
            original_size: "2.00 MB".into(),
            compressed_size: "1.10 MB".into(),
            reduction: "45%".into(),
            download_url: "/download/abc123".into(),
        }
    }

    fn compressing(controller: &mut UploadController<RecordingSurface>) -> TaskHandle {
        controller.handle(ControllerEvent::FilePicked(deck()));
        controller.handle(ControllerEvent::Compress(CompressionPreset::Balanced));
        let task = TaskHandle::new("abc123");
        controller.handle(ControllerEvent::SubmitAccepted(task.clone()));
        task
    }

    fn close_count(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, Command::CloseStream(_)))
            .count()
    }

    #[test]
    fn test_drop_accepts_presentation_suffixes() {
        for name in ["deck.ppt", "deck.pptx"] {
            let mut controller = UploadController::new(RecordingSurface::default());
            let file = SelectedFile::new(name, 1536, format!("/tmp/{name}"));
            controller.handle(ControllerEvent::FileDropped(file));

            assert_eq!(controller.state(), UiState::FileSelected);
            assert_eq!(
                controller.surface().file,
                Some((name.to_string(), "1.5 KB".to_string()))
            );
            assert!(controller.surface().compress_enabled);
            assert!(controller.surface().notices.is_empty());
        }
    }

    #[test]
    fn test_drop_rejects_other_suffixes_with_one_notice() {
        for name in ["deck.pdf", "deck.PPTX", "notes.txt", "ppt"] {
            let mut controller = UploadController::new(RecordingSurface::default());
            let file = SelectedFile::new(name, 10, format!("/tmp/{name}"));
            let commands = controller.handle(ControllerEvent::FileDropped(file));

            assert!(commands.is_empty());
            assert_eq!(controller.state(), UiState::Idle);
            assert_eq!(
                controller.surface().notices,
                vec!["Please choose a PPT or PPTX file".to_string()]
            );
            assert!(!controller.surface().compress_enabled);
        }
    }

    #[test]
    fn test_picker_only_from_idle_click_or_shortcut() {
        let mut controller = UploadController::new(RecordingSurface::default());
        assert_eq!(
            controller.handle(ControllerEvent::DropZoneClicked),
            vec![Command::OpenFilePicker]
        );
        assert_eq!(
            controller.handle(ControllerEvent::OpenShortcut),
            vec![Command::OpenFilePicker]
        );

        controller.handle(ControllerEvent::FilePicked(deck()));
        assert!(controller.handle(ControllerEvent::DropZoneClicked).is_empty());
        assert_eq!(
            controller.handle(ControllerEvent::OpenShortcut),
            vec![Command::OpenFilePicker]
        );

        controller.handle(ControllerEvent::Compress(CompressionPreset::High));
        assert!(controller.handle(ControllerEvent::OpenShortcut).is_empty());
    }

    #[test]
    fn test_remove_file_resets_to_idle() {
        let mut controller = UploadController::new(RecordingSurface::default());
        controller.handle(ControllerEvent::FilePicked(deck()));
        controller.handle(ControllerEvent::RemoveFile);

        assert_eq!(controller.state(), UiState::Idle);
        assert_eq!(controller.session().selected_file(), None);
        assert_eq!(controller.surface().file, None);
        assert!(!controller.surface().compress_enabled);
    }

    #[test]
    fn test_compress_disables_action_and_submits() {
        let mut controller = UploadController::new(RecordingSurface::default());
        controller.handle(ControllerEvent::FilePicked(deck()));
        let commands = controller.handle(ControllerEvent::Compress(CompressionPreset::Balanced));

        assert_eq!(
            commands,
            vec![Command::Submit {
                file: deck(),
                preset: CompressionPreset::Balanced
            }]
        );
        assert_eq!(controller.state(), UiState::Compressing);
        assert!(!controller.surface().compress_enabled);
        assert_eq!(
            controller.surface().progress,
            Some((0, PREPARING_MESSAGE.to_string()))
        );

        // a second press while compressing does nothing
        assert!(controller
            .handle(ControllerEvent::Compress(CompressionPreset::Balanced))
            .is_empty());
    }

    #[test]
    fn test_full_run_to_result() {
        let mut controller = UploadController::new(RecordingSurface::default());
        controller.handle(ControllerEvent::FilePicked(deck()));
        controller.handle(ControllerEvent::Compress(CompressionPreset::Balanced));

        let task = TaskHandle::new("abc123");
        let commands = controller.handle(ControllerEvent::SubmitAccepted(task.clone()));
        assert_eq!(commands, vec![Command::OpenStream(task.clone())]);
        assert_eq!(controller.session().open_stream(), Some(&task));

        controller.handle(ControllerEvent::Stream(
            task.clone(),
            ProgressEvent::Progress {
                percent: 50,
                message: "Optimizing images".into(),
            },
        ));
        assert_eq!(
            controller.surface().progress,
            Some((50, "Optimizing images".to_string()))
        );

        let commands = controller.handle(ControllerEvent::Stream(task.clone(), completed()));
        assert_eq!(commands, vec![Command::CloseStream(task)]);
        assert_eq!(controller.state(), UiState::ResultShown);
        assert_eq!(controller.surface().progress, None);

        let result = controller.surface().result.clone().unwrap();
        assert_eq!(result.original_size, "2.00 MB");
        assert_eq!(result.compressed_size, "1.10 MB");
        assert_eq!(result.reduction, "45%");
        assert_eq!(result.download_url, "/download/abc123");
        assert!(controller.surface().notices.is_empty());
    }

    #[test]
    fn test_submit_rejected_keeps_file() {
        let mut controller = UploadController::new(RecordingSurface::default());
        controller.handle(ControllerEvent::FilePicked(deck()));
        controller.handle(ControllerEvent::Compress(CompressionPreset::Balanced));
        let commands = controller.handle(ControllerEvent::SubmitFailed(
            AppError::SubmissionRejected(Some("file too large".into())),
        ));

        assert_eq!(close_count(&commands), 0);
        assert_eq!(controller.state(), UiState::FileSelected);
        assert_eq!(controller.session().selected_file(), Some(&deck()));
        assert_eq!(controller.surface().notices, vec!["file too large".to_string()]);
        assert!(controller.surface().compress_enabled);
        assert_eq!(controller.surface().progress, None);
    }

    #[test]
    fn test_submit_network_failure_uses_generic_message() {
        let mut controller = UploadController::new(RecordingSurface::default());
        controller.handle(ControllerEvent::FilePicked(deck()));
        controller.handle(ControllerEvent::Compress(CompressionPreset::Balanced));
        controller.handle(ControllerEvent::SubmitFailed(AppError::Network));

        assert_eq!(controller.state(), UiState::FileSelected);
        assert_eq!(
            controller.surface().notices,
            vec!["Network error, please try again".to_string()]
        );
    }

    #[test]
    fn test_stream_error_event_closes_once() {
        let mut controller = UploadController::new(RecordingSurface::default());
        let task = compressing(&mut controller);

        let commands = controller.handle(ControllerEvent::Stream(
            task.clone(),
            ProgressEvent::Error {
                message: Some("corrupt file".into()),
            },
        ));
        assert_eq!(commands, vec![Command::CloseStream(task.clone())]);
        assert_eq!(controller.state(), UiState::FileSelected);
        assert_eq!(controller.surface().notices, vec!["corrupt file".to_string()]);
        assert!(controller.surface().compress_enabled);

        // late failure from the same stream is not a second close
        let commands = controller.handle(ControllerEvent::StreamFailed(task));
        assert_eq!(close_count(&commands), 0);
        assert_eq!(controller.surface().notices.len(), 1);
    }

    #[test]
    fn test_stream_transport_failure() {
        let mut controller = UploadController::new(RecordingSurface::default());
        let task = compressing(&mut controller);

        let commands = controller.handle(ControllerEvent::StreamFailed(task.clone()));
        assert_eq!(commands, vec![Command::CloseStream(task)]);
        assert_eq!(controller.state(), UiState::FileSelected);
        assert_eq!(
            controller.surface().notices,
            vec!["Connection lost, please try again".to_string()]
        );
        assert_eq!(controller.session().open_stream(), None);
    }

    #[test]
    fn test_events_from_other_tasks_are_ignored() {
        let mut controller = UploadController::new(RecordingSurface::default());
        compressing(&mut controller);

        let stale = TaskHandle::new("old");
        assert!(controller
            .handle(ControllerEvent::Stream(stale.clone(), completed()))
            .is_empty());
        assert!(controller
            .handle(ControllerEvent::StreamFailed(stale))
            .is_empty());
        assert_eq!(controller.state(), UiState::Compressing);
    }

    #[test]
    fn test_heartbeat_changes_nothing() {
        let mut controller = UploadController::new(RecordingSurface::default());
        let task = compressing(&mut controller);
        let before = controller.session().clone();

        assert!(controller
            .handle(ControllerEvent::Stream(task, ProgressEvent::Other))
            .is_empty());
        assert_eq!(controller.session(), &before);
    }

    #[test]
    fn test_dismiss_result_returns_to_idle() {
        let mut controller = UploadController::new(RecordingSurface::default());
        let task = compressing(&mut controller);
        controller.handle(ControllerEvent::Stream(task, completed()));

        let commands = controller.handle(ControllerEvent::DismissResult);
        assert!(commands.is_empty());
        assert_eq!(controller.state(), UiState::Idle);
        assert_eq!(controller.session().selected_file(), None);
        assert_eq!(controller.surface().result, None);
        assert_eq!(controller.surface().file, None);
        assert!(!controller.surface().compress_enabled);
    }

    #[test]
    fn test_compress_enabled_only_in_file_selected() {
        let file = deck();
        let cases = [
            (Session::Idle, false),
            (Session::FileSelected { file: file.clone() }, true),
            (
                Session::Compressing {
                    file,
                    stream: None,
                },
                false,
            ),
            (
                Session::ResultShown {
                    result: CompressionResult {
                        original_size: "2.00 MB".into(),
                        compressed_size: "1.10 MB".into(),
                        reduction: "45%".into(),
                        download_url: "/download/abc123".into(),
                    },
                },
                false,
            ),
        ];
        for (session, enabled) in cases {
            assert_eq!(session.compress_enabled(), enabled, "{:?}", session);
        }
    }

    #[test]
    fn test_at_most_one_stream_per_run() {
        let (session, _) = transition(Session::Idle, ControllerEvent::FilePicked(deck()));
        let (session, _) = transition(
            session,
            ControllerEvent::Compress(CompressionPreset::Small),
        );
        let (session, effects) =
            transition(session, ControllerEvent::SubmitAccepted(TaskHandle::new("a")));
        assert_eq!(effects.len(), 1);

        // a duplicate acceptance cannot open a second stream
        let (session, effects) =
            transition(session, ControllerEvent::SubmitAccepted(TaskHandle::new("b")));
        assert!(effects.is_empty());
        assert_eq!(session.open_stream(), Some(&TaskHandle::new("a")));
    }
}
