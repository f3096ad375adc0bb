use std::fmt;

use super::AppError;

const DEFAULT_QUALITY: &str = "HD";

/// User supplied identifier of the source content, usually a video URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference(String);

impl VideoReference {
    /// Trims surrounding whitespace and rejects empty input.
    pub fn new(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::EmptyReference);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub format_id: String,
    pub quality: String,
    pub ext: String,
}

impl fmt::Display for FormatOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (.{})", self.quality, self.ext)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub quality: Option<String>,
    /// Server order is preserved.
    pub formats: Vec<FormatOption>,
}

impl VideoMetadata {
    pub fn quality_label(&self) -> &str {
        self.quality
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUALITY)
    }

    pub fn format(&self, format_id: &str) -> Option<&FormatOption> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub reference: VideoReference,
    pub format_id: String,
    pub title: String,
}

/// One percentage reading pushed by the backend, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ProgressSample(f64);

impl ProgressSample {
    pub const COMPLETE: f64 = 100.0;

    /// Clamps into range; `NaN` has no meaningful percentage and is rejected.
    pub fn new(percent: f64) -> Option<Self> {
        if percent.is_nan() {
            return None;
        }
        Some(Self(percent.clamp(0.0, Self::COMPLETE)))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self.0 >= Self::COMPLETE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FetchingMetadata,
    MetadataReady,
    Downloading,
    Completed,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::FetchingMetadata => "fetching metadata",
            SessionState::MetadataReady => "metadata ready",
            SessionState::Downloading => "downloading",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_trimmed() {
        let reference = VideoReference::new("  https://youtu.be/abc \n").unwrap();
        assert_eq!(reference.as_str(), "https://youtu.be/abc");
    }

    #[test]
    fn test_blank_reference_rejected() {
        assert_eq!(VideoReference::new(""), Err(AppError::EmptyReference));
        assert_eq!(VideoReference::new("   "), Err(AppError::EmptyReference));
    }

    #[test]
    fn test_progress_sample_clamped() {
        assert_eq!(ProgressSample::new(-4.0).unwrap().percent(), 0.0);
        assert_eq!(ProgressSample::new(130.5).unwrap().percent(), 100.0);
        assert!(ProgressSample::new(100.0).unwrap().is_complete());
        assert!(!ProgressSample::new(99.9).unwrap().is_complete());
        assert!(ProgressSample::new(f64::NAN).is_none());
    }

    #[test]
    fn test_format_label_and_quality_fallback() {
        let format = FormatOption {
            format_id: "137".to_string(),
            quality: "1080p".to_string(),
            ext: "mp4".to_string(),
        };
        assert_eq!(format.to_string(), "1080p (.mp4)");

        let metadata = VideoMetadata {
            title: "Clip".to_string(),
            thumbnail: String::new(),
            duration: "3:07".to_string(),
            quality: None,
            formats: vec![format],
        };
        assert_eq!(metadata.quality_label(), "HD");
        assert!(metadata.format("137").is_some());
        assert!(metadata.format("22").is_none());
    }
}
