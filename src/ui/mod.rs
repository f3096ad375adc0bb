use iced::{
    widget::{button, column, pick_list, progress_bar, row, text, text_input, Column, Space},
    Alignment, Element, Length,
};

use crate::application::{ProgressDisplay, SessionSnapshot};
use crate::domain::{FormatOption, SessionState, VideoMetadata};

/// Main view state
pub struct DownloadView {
    pub reference_input: String,
    pub status_message: String,
    pub session: SessionSnapshot,
    pub progress: ProgressDisplay,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            reference_input: String::new(),
            status_message: "Paste a URL below to begin".to_string(),
            session: SessionSnapshot::default(),
            progress: ProgressDisplay::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    ReferenceChanged(String),
    PastePressed,
    GetVideoPressed,
    FormatSelected(FormatOption),
    DownloadPressed,
    DownloadAnotherPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::ReferenceChanged(reference) => {
                self.reference_input = reference;
            }
            DownloadMessage::DownloadAnotherPressed => {
                self.reference_input.clear();
            }
            _ => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let body = match &self.session.metadata {
            Some(metadata) => self.metadata_view(metadata),
            None => self.input_view(),
        };

        column![
            text("TubeFetch").size(32),
            Space::new().height(Length::Fixed(20.0)),
            body,
            Space::new().height(Length::Fixed(10.0)),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }

    fn input_view(&self) -> Element<'_, DownloadMessage> {
        let fetching = self.session.state == SessionState::FetchingMetadata;

        column![
            text("Video URL:").size(16),
            row![
                text_input("https://www.youtube.com/watch?v=...", &self.reference_input)
                    .on_input(DownloadMessage::ReferenceChanged)
                    .on_submit(DownloadMessage::GetVideoPressed)
                    .padding(10),
                button("Paste")
                    .on_press(DownloadMessage::PastePressed)
                    .padding(10),
            ]
            .spacing(10),
            button(if fetching { "ANALYZING..." } else { "GET VIDEO" })
                .on_press_maybe((!fetching).then_some(DownloadMessage::GetVideoPressed))
                .padding([10, 20]),
        ]
        .spacing(10)
        .into()
    }

    fn metadata_view<'a>(&'a self, metadata: &'a VideoMetadata) -> Element<'a, DownloadMessage> {
        let downloading = self.session.state == SessionState::Downloading;
        let selected = self
            .session
            .selected_format
            .as_deref()
            .and_then(|id| metadata.format(id))
            .cloned();

        let mut content: Column<'a, DownloadMessage> = column![
            text(&metadata.title).size(22),
            text(&metadata.thumbnail).size(12),
            row![
                text(&metadata.duration).size(14),
                text(metadata.quality_label()).size(14),
                text("READY").size(14),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            pick_list(
                metadata.formats.clone(),
                selected,
                DownloadMessage::FormatSelected
            ),
        ]
        .spacing(10);

        if downloading {
            let progress = self.progress;
            content = content.push(
                row![
                    text(progress.label().to_string()).size(12),
                    text(format!("{}%", progress.rounded())).size(12),
                ]
                .spacing(10),
            );
            content = content.push(progress_bar(0.0..=100.0, progress.percent() as f32));
        }

        content
            .push(
                button(if downloading { "DOWNLOADING..." } else { "DOWNLOAD NOW" })
                    .on_press_maybe((!downloading).then_some(DownloadMessage::DownloadPressed))
                    .padding([10, 20]),
            )
            .push(
                button("Download another video")
                    .on_press(DownloadMessage::DownloadAnotherPressed)
                    .padding([5, 10]),
            )
            .into()
    }
}
