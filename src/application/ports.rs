//! Capabilities the orchestrator is wired with. Platform adapters live in
//! `crate::adapters`; test doubles live in `stub`.

use async_trait::async_trait;
use bytes::Bytes;

use super::progress::{ProgressDisplay, ProgressSubscription};
use crate::api;
use crate::domain::{AppError, DownloadRequest, VideoMetadata, VideoReference};

/// Request/response side of the conversion backend
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    async fn fetch_metadata(&self, reference: &VideoReference) -> api::Result<VideoMetadata>;

    /// Not cancellable once issued.
    async fn download(&self, request: &DownloadRequest) -> api::Result<Bytes>;
}

/// Server-push side of the conversion backend
pub trait ProgressSource: Send + Sync {
    /// Opening must not wait for the first sample.
    fn open(&self, reference: &VideoReference) -> ProgressSubscription;
}

#[async_trait]
pub trait FileDeliverySink: Send + Sync {
    async fn deliver(&self, payload: Bytes, suggested_file_name: &str);
}

#[async_trait]
pub trait ClipboardProvider: Send + Sync {
    /// Fails with [`AppError::ClipboardDenied`] when access is refused.
    async fn read_text(&self) -> Result<String, AppError>;
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, display: ProgressDisplay);
}
