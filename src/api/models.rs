use serde::{Deserialize, Serialize};

use crate::domain::{FormatOption, VideoMetadata};

pub const BASE_URL_ENV: &str = "TUBEFETCH_BASE_URL";
pub const USER_AGENT_ENV: &str = "TUBEFETCH_USER_AGENT";

/// Request body for `/api/video-info`
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfoRequest<'a> {
    pub url: &'a str,
}

/// Response from the `/api/video-info` endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoInfoResponse {
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatEntry {
    #[serde(rename = "formatId")]
    pub format_id: String,
    pub quality: String,
    #[serde(default)]
    pub ext: String,
}

impl From<VideoInfoResponse> for VideoMetadata {
    fn from(response: VideoInfoResponse) -> Self {
        Self {
            title: response.title,
            thumbnail: response.thumbnail,
            duration: response.duration,
            quality: response.quality,
            formats: response
                .formats
                .into_iter()
                .map(|f| FormatOption {
                    format_id: f.format_id,
                    quality: f.quality,
                    ext: f.ext,
                })
                .collect(),
        }
    }
}

/// Request body for `/api/download`
#[derive(Debug, Clone, Serialize)]
pub struct DownloadBody<'a> {
    pub url: &'a str,
    pub format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Single backend serving metadata, download and progress endpoints
    pub base_url: String,
    pub user_agent: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var(BASE_URL_ENV).unwrap_or(defaults.base_url),
            user_agent: std::env::var(USER_AGENT_ENV).unwrap_or(defaults.user_agent),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_agent: concat!("tubefetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_info_keeps_server_order() {
        let body = json!({
            "title": "Clip",
            "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
            "duration": "4:05",
            "formats": [
                { "formatId": "137", "quality": "1080p", "ext": "mp4" },
                { "formatId": "22", "quality": "720p", "ext": "mp4" },
                { "formatId": "18", "quality": "360p", "ext": "mp4" }
            ]
        });
        let response: VideoInfoResponse = serde_json::from_value(body).unwrap();
        let metadata = VideoMetadata::from(response);

        let ids: Vec<_> = metadata.formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["137", "22", "18"]);
        assert_eq!(metadata.quality, None);
        assert_eq!(metadata.duration, "4:05");
    }

    #[test]
    fn test_download_body_omits_missing_title() {
        let body = DownloadBody {
            url: "https://youtu.be/abc",
            format: "22",
            title: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "url": "https://youtu.be/abc", "format": "22" })
        );
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var(BASE_URL_ENV, "https://fetch.example:9443");
        std::env::set_var(USER_AGENT_ENV, "tubefetch-test/1");
        let config = ApiConfig::from_env();
        assert_eq!(config.base_url, "https://fetch.example:9443");
        assert_eq!(config.user_agent, "tubefetch-test/1");

        std::env::remove_var(BASE_URL_ENV);
        std::env::remove_var(USER_AGENT_ENV);
        let config = ApiConfig::from_env();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.user_agent.starts_with("tubefetch/"));
    }
}
