use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::format_selector::FormatSelector;
use super::ports::{ConversionBackend, FileDeliverySink, ProgressObserver, ProgressSource};
use super::progress::{ProgressDisplay, ProgressSubscription};
use crate::domain::{
    AppError, DownloadRequest, ProgressSample, SessionState, VideoMetadata, VideoReference,
};
use crate::utils::suggested_file_name;

/// How an async operation ended relative to the session that started it.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// The session was still current and took the result.
    Current(T),
    /// The session was reset or replaced meanwhile; the result was ignored.
    Stale,
}

/// Read-only view of the session for rendering. Progress reaches the shell
/// through the [`ProgressObserver`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub reference: Option<VideoReference>,
    pub metadata: Option<VideoMetadata>,
    pub selected_format: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            reference: None,
            metadata: None,
            selected_format: None,
        }
    }
}

struct Session {
    state: SessionState,
    /// Bumped on every transition that starts async work or abandons it.
    /// Async results carry the epoch they started in and are dropped on mismatch.
    epoch: u64,
    reference: Option<VideoReference>,
    metadata: Option<VideoMetadata>,
    selector: FormatSelector,
    progress: ProgressDisplay,
    subscription: Option<CancellationToken>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            epoch: 0,
            reference: None,
            metadata: None,
            selector: FormatSelector::default(),
            progress: ProgressDisplay::default(),
            subscription: None,
        }
    }

    fn begin(&mut self, state: SessionState) -> u64 {
        self.epoch += 1;
        self.state = state;
        self.epoch
    }

    fn close_subscription(&mut self) {
        if let Some(token) = self.subscription.take() {
            token.cancel();
        }
    }

    fn clear(&mut self) {
        self.close_subscription();
        self.reference = None;
        self.metadata = None;
        self.selector.clear();
        self.progress = ProgressDisplay::default();
    }

    fn ensure_settled(&self, action: &'static str) -> Result<(), AppError> {
        match self.state {
            SessionState::FetchingMetadata | SessionState::Downloading => {
                Err(AppError::InvalidTransition {
                    action,
                    state: self.state,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A metadata request whose session is already in `FetchingMetadata`.
#[must_use = "the session stays in FetchingMetadata until the fetch is finished"]
pub struct PendingMetadata {
    orchestrator: DownloadOrchestrator,
    epoch: u64,
    reference: VideoReference,
}

impl PendingMetadata {
    pub async fn finish(self) -> Result<Settled<VideoMetadata>, AppError> {
        self.orchestrator
            .complete_metadata(self.epoch, self.reference)
            .await
    }
}

/// A download whose session is already in `Downloading`.
#[must_use = "the session stays in Downloading until the download is finished"]
pub struct PendingDownload {
    orchestrator: DownloadOrchestrator,
    epoch: u64,
    request: DownloadRequest,
    file_name: String,
}

impl PendingDownload {
    pub async fn finish(self) -> Result<Settled<String>, AppError> {
        self.orchestrator
            .complete_download(self.epoch, self.request, self.file_name)
            .await
    }
}

/// Drives one session at a time through
/// `Idle -> FetchingMetadata -> MetadataReady -> Downloading -> Completed | Failed`.
///
/// Each async operation is split in two: `begin_*` validates and performs the
/// state transition synchronously, the returned pending handle does the I/O.
/// Cloning is cheap and every clone drives the same session, so a reset can
/// be issued while another clone is awaiting a download.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    backend: Arc<dyn ConversionBackend>,
    progress: Arc<dyn ProgressSource>,
    sink: Arc<dyn FileDeliverySink>,
    observer: Arc<dyn ProgressObserver>,
    session: Arc<Mutex<Session>>,
}

impl DownloadOrchestrator {
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        progress: Arc<dyn ProgressSource>,
        sink: Arc<dyn FileDeliverySink>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            backend,
            progress,
            sink,
            observer,
            session: Arc::new(Mutex::new(Session::new())),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        SessionSnapshot {
            state: session.state,
            reference: session.reference.clone(),
            metadata: session.metadata.clone(),
            selected_format: session.selector.selected_id().map(str::to_string),
        }
    }

    /// Moves to `FetchingMetadata` for `reference`, dropping any metadata
    /// already held. Empty references are rejected before any network call.
    pub fn begin_metadata(&self, reference: &str) -> Result<PendingMetadata, AppError> {
        let reference = VideoReference::new(reference)?;

        let epoch = {
            let mut session = self.session.lock();
            session.ensure_settled("request metadata")?;
            session.clear();
            session.reference = Some(reference.clone());
            session.begin(SessionState::FetchingMetadata)
        };
        info!(reference = %reference, "fetching metadata");

        Ok(PendingMetadata {
            orchestrator: self.clone(),
            epoch,
            reference,
        })
    }

    async fn complete_metadata(
        &self,
        epoch: u64,
        reference: VideoReference,
    ) -> Result<Settled<VideoMetadata>, AppError> {
        let result = self.backend.fetch_metadata(&reference).await;

        let mut session = self.session.lock();
        if session.epoch != epoch {
            debug!(reference = %reference, "ignoring metadata for abandoned session");
            return Ok(Settled::Stale);
        }

        let ready = result
            .map_err(|e| AppError::MetadataUnavailable(e.to_string()))
            .and_then(|metadata| {
                FormatSelector::for_metadata(&metadata)
                    .map(|selector| (metadata, selector))
                    .ok_or_else(|| {
                        AppError::MetadataUnavailable("no downloadable formats".to_string())
                    })
            });

        match ready {
            Ok((metadata, selector)) => {
                info!(
                    title = %metadata.title,
                    formats = metadata.formats.len(),
                    selected = selector.selected_id().unwrap_or_default(),
                    "metadata ready"
                );
                session.selector = selector;
                session.metadata = Some(metadata.clone());
                session.state = SessionState::MetadataReady;
                Ok(Settled::Current(metadata))
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "metadata unavailable");
                session.clear();
                session.begin(SessionState::Idle);
                Err(e)
            }
        }
    }

    pub fn select_format(&self, format_id: &str) -> Result<(), AppError> {
        let mut session = self.session.lock();
        session.ensure_settled("change format")?;
        session.selector.select(format_id)?;
        debug!(format = format_id, "format selected");
        Ok(())
    }

    /// Selects `format_id` and moves to `Downloading`. Finishing the returned
    /// download opens the progress subscription, then issues the download
    /// request. On success the payload goes to the delivery sink and the
    /// suggested file name is returned.
    ///
    /// Allowed from `MetadataReady`, and from `Completed` or `Failed` to
    /// download the retained metadata again.
    pub fn begin_download(&self, format_id: &str) -> Result<PendingDownload, AppError> {
        let mut session = self.session.lock();
        let not_ready = AppError::InvalidTransition {
            action: "start a download",
            state: session.state,
        };
        if !matches!(
            session.state,
            SessionState::MetadataReady | SessionState::Completed | SessionState::Failed
        ) {
            return Err(not_ready);
        }
        let (Some(reference), Some(metadata)) = (&session.reference, &session.metadata) else {
            return Err(not_ready);
        };
        let (reference, title) = (reference.clone(), metadata.title.clone());

        let ext = session.selector.select(format_id)?.ext.clone();
        let file_name = suggested_file_name(&title, &ext);
        let request = DownloadRequest {
            reference,
            format_id: format_id.to_string(),
            title,
        };

        session.progress = ProgressDisplay::default();
        let epoch = session.begin(SessionState::Downloading);
        drop(session);
        info!(reference = %request.reference, format = %request.format_id, "download started");

        Ok(PendingDownload {
            orchestrator: self.clone(),
            epoch,
            request,
            file_name,
        })
    }

    async fn complete_download(
        &self,
        epoch: u64,
        request: DownloadRequest,
        file_name: String,
    ) -> Result<Settled<String>, AppError> {
        if self.session.lock().epoch != epoch {
            debug!(reference = %request.reference, "download abandoned before dispatch");
            return Ok(Settled::Stale);
        }

        let subscription = self.progress.open(&request.reference);
        self.track_subscription(epoch, &subscription);
        let mut samples = subscription.into_stream();
        let mut streaming = true;

        let mut download = self.backend.download(&request);
        let outcome = loop {
            tokio::select! {
                biased;
                result = &mut download => break result,
                sample = samples.next(), if streaming => match sample {
                    Some(sample) => self.record_progress(epoch, sample),
                    None => streaming = false,
                },
            }
        };
        // Dropping the stream closes the subscription it owns.
        drop(samples);

        let current = {
            let mut session = self.session.lock();
            if session.epoch == epoch {
                session.subscription = None;
                session.state = if outcome.is_ok() {
                    SessionState::Completed
                } else {
                    SessionState::Failed
                };
                true
            } else {
                false
            }
        };
        if !current {
            debug!(reference = %request.reference, "ignoring download result for abandoned session");
            return Ok(Settled::Stale);
        }

        match outcome {
            Ok(payload) => {
                info!(file_name = %file_name, bytes = payload.len(), "download completed");
                self.sink.deliver(payload, &file_name).await;
                Ok(Settled::Current(file_name))
            }
            Err(e) => {
                warn!(reference = %request.reference, error = %e, "download failed");
                Err(AppError::DownloadFailed(e.to_string()))
            }
        }
    }

    /// Back to `Idle` from any state. Clears metadata, selection and progress,
    /// closes an open subscription, and orphans any in-flight request.
    pub fn reset(&self) {
        let previous = {
            let mut session = self.session.lock();
            let previous = session.state;
            session.clear();
            session.begin(SessionState::Idle);
            previous
        };
        info!(from = %previous, "session reset");
        self.observer.on_progress(ProgressDisplay::default());
    }

    fn track_subscription(&self, epoch: u64, subscription: &ProgressSubscription) {
        let mut session = self.session.lock();
        if session.epoch == epoch {
            session.subscription = Some(subscription.cancel_token());
        }
    }

    fn record_progress(&self, epoch: u64, sample: ProgressSample) {
        let shown = {
            let mut session = self.session.lock();
            if session.epoch != epoch || session.state != SessionState::Downloading {
                return;
            }
            session.progress.apply(sample)
        };
        debug!(sample = sample.percent(), shown = shown.percent(), "progress");
        self.observer.on_progress(shown);
    }
}
