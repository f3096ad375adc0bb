use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{self, ApiClient};
use crate::application::{ConversionBackend, ProgressSource, ProgressSubscription};
use crate::domain::{DownloadRequest, VideoMetadata, VideoReference};

#[async_trait]
impl ConversionBackend for ApiClient {
    async fn fetch_metadata(&self, reference: &VideoReference) -> api::Result<VideoMetadata> {
        self.fetch_video_info(reference).await
    }

    async fn download(&self, request: &DownloadRequest) -> api::Result<Bytes> {
        self.download_media(request).await
    }
}

/// Progress over the backend's server-sent events endpoint.
///
/// The connection is started on a background task as soon as the
/// subscription is opened and torn down when the subscription closes.
#[derive(Clone)]
pub struct SseProgressSource {
    client: ApiClient,
}

impl SseProgressSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl ProgressSource for SseProgressSource {
    fn open(&self, reference: &VideoReference) -> ProgressSubscription {
        let (sender, receiver) = mpsc::unbounded();
        let cancel = CancellationToken::new();

        let client = self.client.clone();
        let reference = reference.clone();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => debug!(reference = %reference, "progress channel cancelled"),
                _ = client.pump_progress(&reference, sender) => {}
            }
        });

        ProgressSubscription::new(receiver.boxed(), cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::domain::ProgressSample;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_subscription_over_sse() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/progress")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://youtu.be/aqz-KE-bpKQ".into(),
            ))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("event:progress\ndata:12.0\n\nevent:progress\ndata:99.0\n\nevent:progress\ndata:100.0\n\nevent:progress\ndata:100.0\n\n")
            .create_async()
            .await;

        let source = SseProgressSource::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        }));
        let subscription = source.open(&VideoReference::new("https://youtu.be/aqz-KE-bpKQ").unwrap());
        let token = subscription.cancel_token();

        let received: Vec<f64> = subscription
            .into_stream()
            .map(ProgressSample::percent)
            .collect()
            .await;

        assert_eq!(received, [12.0, 99.0, 100.0]);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_unreachable_backend_closes_quietly() {
        let source = SseProgressSource::new(ApiClient::new(ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        }));
        let mut subscription = source.open(&VideoReference::new("https://youtu.be/x").unwrap());

        assert_eq!(subscription.next().await, None);
        assert!(subscription.is_closed());
    }
}
