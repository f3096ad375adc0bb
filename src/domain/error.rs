use thiserror::Error;

use super::SessionState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("Please enter a video URL")]
    EmptyReference,

    #[error("Error fetching video details: {0}")]
    MetadataUnavailable(String),

    #[error("Format {0} is not offered for this video")]
    InvalidFormat(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Clipboard access denied")]
    ClipboardDenied,

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

impl AppError {
    /// Whether the user can recover by trying again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::MetadataUnavailable(_) | AppError::DownloadFailed(_) | AppError::ClipboardDenied
        )
    }
}
