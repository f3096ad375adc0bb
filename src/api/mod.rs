mod client;
mod models;
mod sse;

#[cfg(test)]
pub use client::ApiError;
pub use client::{ApiClient, Result};
pub use models::ApiConfig;
