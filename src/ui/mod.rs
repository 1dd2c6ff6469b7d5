use iced::{
    widget::{
        button, center, column, container, mouse_area, opaque, progress_bar, radio, row, stack,
        text, Column, Space,
    },
    Alignment, Element, Length,
};

use crate::application::controller::UploadSurface;
use crate::domain::{CompressionPreset, CompressionResult};

/// Chip shown in the drop zone once a file is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChip {
    pub name: String,
    pub size: String,
}

/// The progress indicator. Built once with the view and toggled, never recreated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressPanel {
    pub visible: bool,
    pub percent: u8,
    pub message: String,
}

impl ProgressPanel {
    pub fn label(&self) -> String {
        if self.message.is_empty() {
            format!("{}%", self.percent)
        } else {
            self.message.clone()
        }
    }
}

/// State of the "Download" action inside the result overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    NotStarted,
    InProgress(f32),
    Saved(String),
    Failed(String),
}

/// Main view state
pub struct UploadView {
    pub preset: CompressionPreset,
    pub drag_hover: bool,
    pub download: DownloadStatus,
    file: Option<FileChip>,
    compress_enabled: bool,
    progress: ProgressPanel,
    result: Option<CompressionResult>,
    pending_notices: Vec<String>,
}

impl Default for UploadView {
    fn default() -> Self {
        Self::new(CompressionPreset::default())
    }
}

#[derive(Debug, Clone)]
pub enum UploadMessage {
    DropZonePressed,
    RemoveFilePressed,
    PresetSelected(CompressionPreset),
    CompressPressed,
    DownloadPressed,
    CompressAnotherPressed,
    BackdropPressed,
}

impl UploadView {
    pub fn new(preset: CompressionPreset) -> Self {
        Self {
            preset,
            drag_hover: false,
            download: DownloadStatus::NotStarted,
            file: None,
            compress_enabled: false,
            progress: ProgressPanel::default(),
            result: None,
            pending_notices: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn compress_enabled(&self) -> bool {
        self.compress_enabled
    }

    #[cfg(test)]
    pub fn progress(&self) -> &ProgressPanel {
        &self.progress
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        self.result.as_ref()
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_notices)
    }

    pub fn view(&self) -> Element<'_, UploadMessage> {
        let presets = Column::with_children(CompressionPreset::ALL.iter().map(|preset| {
            radio(
                preset.label(),
                *preset,
                Some(self.preset),
                UploadMessage::PresetSelected,
            )
            .into()
        }))
        .spacing(6);

        let mut content = column![
            text("PPT Compressor").size(32),
            Space::new().height(Length::Fixed(20.0)),
            self.drop_zone(),
        ]
        .spacing(10);

        if self.progress.visible {
            content = content.push(
                column![
                    progress_bar(0.0..=100.0, f32::from(self.progress.percent)),
                    text(self.progress.label()).size(14),
                ]
                .spacing(6),
            );
        }

        content = content
            .push(Space::new().height(Length::Fixed(10.0)))
            .push(text("Compression preset:").size(16))
            .push(presets)
            .push(Space::new().height(Length::Fixed(20.0)))
            .push(
                button("Compress")
                    .on_press_maybe(
                        self.compress_enabled
                            .then_some(UploadMessage::CompressPressed),
                    )
                    .padding([10, 20]),
            );

        let base: Element<'_, UploadMessage> = content.padding(20).into();

        match &self.result {
            Some(result) => stack![
                base,
                mouse_area(
                    container(Space::new())
                        .width(Length::Fill)
                        .height(Length::Fill)
                )
                .on_press(UploadMessage::BackdropPressed),
                center(opaque(self.result_card(result))),
            ]
            .into(),
            None => base,
        }
    }

    fn drop_zone(&self) -> Element<'_, UploadMessage> {
        let inner: Element<'_, UploadMessage> = match &self.file {
            Some(chip) => row![
                column![text(&chip.name).size(16), text(&chip.size).size(12)].spacing(4),
                Space::new().width(Length::Fill),
                button("Remove").on_press(UploadMessage::RemoveFilePressed),
            ]
            .align_y(Alignment::Center)
            .into(),
            None => column![
                text("Drop a PPT or PPTX file here").size(18),
                text("or click to browse (Ctrl/Cmd + O)").size(12),
            ]
            .spacing(6)
            .align_x(Alignment::Center)
            .into(),
        };

        let zone = container(inner)
            .padding(40)
            .width(Length::Fill)
            .style(if self.drag_hover {
                container::rounded_box
            } else {
                container::bordered_box
            });

        mouse_area(zone)
            .on_press(UploadMessage::DropZonePressed)
            .into()
    }

    fn result_card<'a>(&'a self, result: &'a CompressionResult) -> Element<'a, UploadMessage> {
        let download_line = match &self.download {
            DownloadStatus::NotStarted => text(&result.download_url).size(12),
            DownloadStatus::InProgress(fraction) => {
                text(format!("Downloading: {:.1}%", fraction * 100.0)).size(12)
            }
            DownloadStatus::Saved(path) => text(format!("Saved: {}", path)).size(12),
            DownloadStatus::Failed(reason) => text(reason).size(12),
        };

        let downloading = matches!(self.download, DownloadStatus::InProgress(_));

        container(
            column![
                text("Compression complete").size(24),
                row![text("Original:").width(Length::Fixed(120.0)), text(&result.original_size)],
                row![
                    text("Compressed:").width(Length::Fixed(120.0)),
                    text(&result.compressed_size)
                ],
                row![text("Reduced by:").width(Length::Fixed(120.0)), text(&result.reduction)],
                download_line,
                row![
                    button("Download")
                        .on_press_maybe((!downloading).then_some(UploadMessage::DownloadPressed))
                        .padding([10, 20]),
                    button("Compress another")
                        .on_press(UploadMessage::CompressAnotherPressed)
                        .padding([10, 20]),
                ]
                .spacing(10),
            ]
            .spacing(10),
        )
        .padding(30)
        .style(container::rounded_box)
        .into()
    }
}

impl UploadSurface for UploadView {
    fn show_file(&mut self, name: &str, size: &str) {
        self.file = Some(FileChip {
            name: name.to_string(),
            size: size.to_string(),
        });
    }

    fn clear_file(&mut self) {
        self.file = None;
    }

    fn set_compress_enabled(&mut self, enabled: bool) {
        self.compress_enabled = enabled;
    }

    fn show_progress(&mut self, percent: u8, message: &str) {
        self.progress.visible = true;
        self.update_progress(percent, message);
    }

    fn update_progress(&mut self, percent: u8, message: &str) {
        self.progress.percent = percent;
        self.progress.message = message.to_string();
    }

    fn hide_progress(&mut self) {
        self.progress.visible = false;
    }

    fn show_result(&mut self, result: &CompressionResult) {
        self.download = DownloadStatus::NotStarted;
        self.result = Some(result.clone());
    }

    fn hide_result(&mut self) {
        self.result = None;
    }

    fn notify(&mut self, message: &str) {
        self.pending_notices.push(message.to_string());
    }
}
