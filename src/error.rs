//! Error types for prep-pulse

use thiserror::Error;

/// Errors that can occur while parsing input or producing snapshots
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to parse activity payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[cfg(feature = "fetch")]
    #[error("Feed request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[cfg(feature = "fetch")]
    #[error("Feed returned status {0}")]
    FeedStatus(u16),
}
