mod desktop;
mod http;

pub use desktop::{SaveDialogSink, SystemClipboard};
pub use http::SseProgressSource;
