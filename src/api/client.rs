use bytes::Bytes;
use futures::channel::mpsc::UnboundedSender;
use futures::StreamExt;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::models::{ApiConfig, DownloadBody, VideoInfoRequest, VideoInfoResponse};
use super::sse::SseDecoder;
use crate::domain::{DownloadRequest, ProgressSample, VideoMetadata, VideoReference};

const VIDEO_INFO_PATH: &str = "api/video-info";
const DOWNLOAD_PATH: &str = "api/download";
const PROGRESS_PATH: &str = "api/progress";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = match Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                warn!(error = %e, user_agent = %config.user_agent, "HTTP client setup failed, using defaults");
                Client::default()
            }
        };
        Self { config, http }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }

    fn progress_url(&self, reference: &VideoReference) -> Result<Url> {
        let mut url = self.endpoint(PROGRESS_PATH)?;
        url.query_pairs_mut().append_pair("url", reference.as_str());
        Ok(url)
    }

    /// Single request/response exchange against `/api/video-info`
    pub async fn fetch_video_info(&self, reference: &VideoReference) -> Result<VideoMetadata> {
        let url = self.endpoint(VIDEO_INFO_PATH)?;
        debug!(%url, reference = %reference, "requesting video info");

        let response = self
            .http
            .post(url)
            .json(&VideoInfoRequest {
                url: reference.as_str(),
            })
            .send()
            .await?;
        let response = check_status(response, "Video info")?;

        let info: VideoInfoResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        Ok(info.into())
    }

    /// Issues `/api/download` and buffers the raw media payload
    pub async fn download_media(&self, request: &DownloadRequest) -> Result<Bytes> {
        let url = self.endpoint(DOWNLOAD_PATH)?;
        debug!(%url, format = %request.format_id, "requesting download");

        let response = self
            .http
            .post(url)
            .json(&DownloadBody {
                url: request.reference.as_str(),
                format: &request.format_id,
                title: Some(&request.title),
            })
            .send()
            .await?;
        let response = check_status(response, "Download")?;

        Ok(response.bytes().await?)
    }

    /// Connects to `/api/progress` and forwards every percentage to `sink`
    /// until the server closes the channel, the receiver goes away, or a
    /// transport error occurs. The error is handed to the receiver as the
    /// final item.
    pub async fn pump_progress(
        &self,
        reference: &VideoReference,
        sink: UnboundedSender<Result<ProgressSample>>,
    ) {
        if let Err(e) = self.stream_progress(reference, &sink).await {
            let _ = sink.unbounded_send(Err(e));
        }
    }

    async fn stream_progress(
        &self,
        reference: &VideoReference,
        sink: &UnboundedSender<Result<ProgressSample>>,
    ) -> Result<()> {
        let url = self.progress_url(reference)?;
        debug!(%url, "opening progress channel");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check_status(response, "Progress")?;

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            for event in decoder.push(&chunk?)? {
                let Some(sample) = event.percent().and_then(ProgressSample::new) else {
                    debug!(event = %event.event, data = %event.data, "skipping non-progress event");
                    continue;
                };
                if sink.unbounded_send(Ok(sample)).is_err() {
                    return Ok(());
                }
            }
        }
        debug!("progress channel closed by server");
        Ok(())
    }
}

fn check_status(response: Response, what: &str) -> Result<Response> {
    response
        .error_for_status()
        .map_err(|e| ApiError::ApiError(format!("{} request failed: {}", what, e)))
}
