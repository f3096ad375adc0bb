use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::application::{ClipboardProvider, FileDeliverySink};
use crate::domain::AppError;

/// System clipboard through `arboard`.
pub struct SystemClipboard;

#[async_trait]
impl ClipboardProvider for SystemClipboard {
    async fn read_text(&self) -> Result<String, AppError> {
        let read = tokio::task::spawn_blocking(|| {
            arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text())
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "clipboard task failed");
            AppError::ClipboardDenied
        })?;

        match read {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                Err(AppError::ClipboardDenied)
            }
        }
    }
}

/// Asks where to save through the native dialog, then writes the payload.
pub struct SaveDialogSink;

#[async_trait]
impl FileDeliverySink for SaveDialogSink {
    async fn deliver(&self, payload: Bytes, suggested_file_name: &str) {
        let Some(handle) = rfd::AsyncFileDialog::new()
            .set_file_name(suggested_file_name)
            .save_file()
            .await
        else {
            info!(file_name = suggested_file_name, "save cancelled, payload discarded");
            return;
        };

        let path = handle.path().to_path_buf();
        match tokio::fs::write(&path, &payload).await {
            Ok(()) => info!(path = %path.display(), bytes = payload.len(), "file saved"),
            Err(e) => error!(path = %path.display(), error = %e, "failed to save file"),
        }
    }
}
