use tracing::warn;

use super::ports::ClipboardProvider;
use crate::domain::AppError;

/// Reads the clipboard for the reference input. Never touches the session.
pub async fn paste_reference(provider: &dyn ClipboardProvider) -> Result<String, AppError> {
    match provider.read_text().await {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "clipboard read failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::stub::StubClipboard;

    #[tokio::test]
    async fn test_paste_trims() {
        let clipboard = StubClipboard(Ok("  https://youtu.be/aqz-KE-bpKQ\n".to_string()));
        assert_eq!(
            paste_reference(&clipboard).await.unwrap(),
            "https://youtu.be/aqz-KE-bpKQ"
        );
    }

    #[tokio::test]
    async fn test_denied() {
        let clipboard = StubClipboard(Err(AppError::ClipboardDenied));
        assert_eq!(
            paste_reference(&clipboard).await,
            Err(AppError::ClipboardDenied)
        );
    }
}
