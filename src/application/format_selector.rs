use crate::domain::{AppError, FormatOption, VideoMetadata};

/// Chosen output format among the options of the active metadata.
#[derive(Debug, Clone, Default)]
pub struct FormatSelector {
    options: Vec<FormatOption>,
    selected: Option<usize>,
}

impl FormatSelector {
    /// Defaults to the first option; `None` when nothing can be downloaded.
    pub fn for_metadata(metadata: &VideoMetadata) -> Option<Self> {
        if metadata.formats.is_empty() {
            return None;
        }
        Some(Self {
            options: metadata.formats.clone(),
            selected: Some(0),
        })
    }

    pub fn selected(&self) -> Option<&FormatOption> {
        self.selected.and_then(|i| self.options.get(i))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected().map(|f| f.format_id.as_str())
    }

    /// Leaves the current selection untouched on failure.
    pub fn select(&mut self, format_id: &str) -> Result<&FormatOption, AppError> {
        let index = self
            .options
            .iter()
            .position(|f| f.format_id == format_id)
            .ok_or_else(|| AppError::InvalidFormat(format_id.to_string()))?;
        self.selected = Some(index);
        Ok(&self.options[index])
    }

    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
    }
}
