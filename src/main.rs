mod adapters;
mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tubefetch=info")),
        )
        .init();

    iced::application(app::DownloadApp::new, app::update, app::view)
        .title("TubeFetch")
        .window_size((560.0, 760.0))
        .run()
}
