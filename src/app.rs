use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::StreamExt;
use iced::Task;
use tracing::{error, info, warn};

use crate::adapters::{SaveDialogSink, SseProgressSource, SystemClipboard};
use crate::api::{ApiClient, ApiConfig};
use crate::application::{
    paste_reference, DownloadOrchestrator, ProgressDisplay, ProgressObserver, Settled,
};
use crate::domain::{AppError, VideoMetadata};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    orchestrator: DownloadOrchestrator,
}

/// Forwards progress updates into the iced message stream.
struct ChannelObserver(UnboundedSender<ProgressDisplay>);

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, display: ProgressDisplay) {
        let _ = self.0.unbounded_send(display);
    }
}

impl DownloadApp {
    pub fn new() -> (Self, Task<Message>) {
        let config = ApiConfig::from_env();
        info!(backend = %config.base_url, "starting TubeFetch");

        let api_client = ApiClient::new(config);
        let (sender, updates) = mpsc::unbounded();
        let orchestrator = DownloadOrchestrator::new(
            Arc::new(api_client.clone()),
            Arc::new(SseProgressSource::new(api_client)),
            Arc::new(SaveDialogSink),
            Arc::new(ChannelObserver(sender)),
        );

        (
            Self::with_orchestrator(orchestrator),
            Task::stream(updates.map(Message::ProgressUpdated)),
        )
    }

    fn with_orchestrator(orchestrator: DownloadOrchestrator) -> Self {
        Self {
            view: DownloadView::default(),
            orchestrator,
        }
    }

    fn notify(&mut self, error: &AppError) {
        if error.is_recoverable() {
            warn!(error = %error, "user notified");
        } else {
            error!(error = %error, "rejected action");
        }
        self.view.status_message = error.to_string();
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    Pasted(Result<String, AppError>),
    MetadataReceived(Result<Settled<VideoMetadata>, AppError>),
    ProgressUpdated(ProgressDisplay),
    /// Suggested file name of the delivered payload
    DownloadCompleted(Result<Settled<String>, AppError>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    let task = handle(app, message);
    app.view.session = app.orchestrator.snapshot();
    task
}

fn handle(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::PastePressed => {
                    return Task::perform(
                        async move { paste_reference(&SystemClipboard).await },
                        Message::Pasted,
                    );
                }
                DownloadMessage::GetVideoPressed => {
                    let pending = match app.orchestrator.begin_metadata(&app.view.reference_input) {
                        Ok(pending) => pending,
                        Err(e) => {
                            app.notify(&e);
                            return Task::none();
                        }
                    };

                    app.view.status_message = "Analyzing...".to_string();
                    return Task::perform(pending.finish(), Message::MetadataReceived);
                }
                DownloadMessage::FormatSelected(format) => {
                    if let Err(e) = app.orchestrator.select_format(&format.format_id) {
                        app.notify(&e);
                    }
                }
                DownloadMessage::DownloadPressed => {
                    let Some(format_id) = app.view.session.selected_format.clone() else {
                        app.view.status_message = "Select a format first".to_string();
                        return Task::none();
                    };
                    let pending = match app.orchestrator.begin_download(&format_id) {
                        Ok(pending) => pending,
                        Err(e) => {
                            app.notify(&e);
                            return Task::none();
                        }
                    };

                    app.view.progress = ProgressDisplay::default();
                    app.view.status_message = "Downloading...".to_string();
                    return Task::perform(pending.finish(), Message::DownloadCompleted);
                }
                DownloadMessage::DownloadAnotherPressed => {
                    app.orchestrator.reset();
                    app.view.progress = ProgressDisplay::default();
                    app.view.status_message = "Paste a URL below to begin".to_string();
                }
                DownloadMessage::ReferenceChanged(_) => {}
            }
        }
        Message::Pasted(result) => match result {
            Ok(text) => app.view.reference_input = text,
            Err(e) => app.notify(&e),
        },
        Message::MetadataReceived(result) => match result {
            Ok(Settled::Current(metadata)) => {
                app.view.status_message = format!("Ready: {}", metadata.title);
            }
            Ok(Settled::Stale) => {}
            Err(e) => app.notify(&e),
        },
        Message::ProgressUpdated(display) => app.view.progress = display,
        Message::DownloadCompleted(result) => match result {
            Ok(Settled::Current(file_name)) => {
                app.view.status_message = format!("Downloaded: {}", file_name);
            }
            Ok(Settled::Stale) => {}
            Err(e) => app.notify(&e),
        },
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::stub::{
        self, CallLog, RecordingObserver, RecordingSink, StubBackend, StubProgressSource,
    };
    use crate::domain::{ProgressSample, SessionState};

    const REFERENCE: &str = "https://www.youtube.com/watch?v=aqz-KE-bpKQ";

    fn app_with(backend: StubBackend, log: CallLog) -> DownloadApp {
        DownloadApp::with_orchestrator(DownloadOrchestrator::new(
            Arc::new(backend),
            Arc::new(StubProgressSource::new(log)),
            Arc::new(RecordingSink::default()),
            Arc::new(RecordingObserver::default()),
        ))
    }

    fn press(app: &mut DownloadApp, message: DownloadMessage) -> Task<Message> {
        update(app, Message::UiMessage(message))
    }

    #[tokio::test]
    async fn test_get_video_shows_fetching_immediately() {
        let log = CallLog::default();
        let mut app = app_with(
            StubBackend::new(log.clone()).with_metadata(stub::metadata(&["a"])),
            log,
        );

        press(&mut app, DownloadMessage::ReferenceChanged(REFERENCE.to_string()));
        let _task = press(&mut app, DownloadMessage::GetVideoPressed);

        assert_eq!(app.view.session.state, SessionState::FetchingMetadata);
        assert_eq!(app.view.status_message, "Analyzing...");

        // A second press while fetching is rejected, not queued
        let _task = press(&mut app, DownloadMessage::GetVideoPressed);
        assert_eq!(app.view.session.state, SessionState::FetchingMetadata);
        assert!(app.view.status_message.starts_with("Cannot request metadata"));
    }

    #[tokio::test]
    async fn test_download_shows_downloading_immediately() {
        let log = CallLog::default();
        let mut app = app_with(
            StubBackend::new(log.clone())
                .with_metadata(stub::metadata(&["a", "b"]))
                .with_payload(b"media"),
            log,
        );
        let metadata = app.orchestrator.begin_metadata(REFERENCE).unwrap().finish().await;
        update(&mut app, Message::MetadataReceived(metadata));
        assert_eq!(app.view.session.state, SessionState::MetadataReady);

        let _task = press(&mut app, DownloadMessage::DownloadPressed);

        assert_eq!(app.view.session.state, SessionState::Downloading);
        assert_eq!(app.view.progress, ProgressDisplay::default());
        assert_eq!(app.view.status_message, "Downloading...");
    }

    #[tokio::test]
    async fn test_empty_reference_notifies_without_leaving_idle() {
        let log = CallLog::default();
        let mut app = app_with(StubBackend::new(log.clone()), log.clone());

        let _task = press(&mut app, DownloadMessage::GetVideoPressed);

        assert_eq!(app.view.session.state, SessionState::Idle);
        assert_eq!(app.view.status_message, AppError::EmptyReference.to_string());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_progress_update_reaches_view() {
        let log = CallLog::default();
        let mut app = app_with(StubBackend::new(log.clone()), log);

        let mut display = ProgressDisplay::default();
        display.apply(ProgressSample::new(42.0).unwrap());
        update(&mut app, Message::ProgressUpdated(display));

        assert_eq!(app.view.progress.percent(), 42.0);
        assert_eq!(app.view.session.state, SessionState::Idle);
    }
}
