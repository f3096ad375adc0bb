pub mod clipboard;
pub mod format_selector;
pub mod orchestrator;
pub mod ports;
pub mod progress;

pub use clipboard::paste_reference;
pub use orchestrator::{DownloadOrchestrator, SessionSnapshot, Settled};
pub use ports::{ClipboardProvider, ConversionBackend, FileDeliverySink, ProgressObserver, ProgressSource};
pub use progress::{ProgressDisplay, ProgressSubscription};
