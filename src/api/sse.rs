//! Minimal `text/event-stream` decoder for the progress channel.

use super::client::{ApiError, Result};

/// Event name the backend uses for progress updates
pub const PROGRESS_EVENT: &str = "progress";
const DEFAULT_EVENT: &str = "message";
/// Longest line accepted before the stream is treated as malformed
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    /// Parses the payload as a percentage if this event carries progress.
    pub fn percent(&self) -> Option<f64> {
        if self.event != PROGRESS_EVENT && self.event != DEFAULT_EVENT {
            return None;
        }
        self.data.trim().parse::<f64>().ok()
    }
}

/// Incremental decoder; chunks may split lines and UTF-8 sequences anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails once an unterminated line grows past [`MAX_LINE_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            self.pending.clear();
            return Err(ApiError::InvalidResponse(format!(
                "event stream line longer than {} bytes",
                MAX_LINE_BYTES
            )));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }
}
