//! Error types for the Feedgate service.

use thiserror::Error;

/// Main error type for Feedgate operations.
///
/// Rate limiting never produces one of these: a rejected request is a
/// normal `false` from the limiter.
#[derive(Error, Debug)]
pub enum FeedgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Update source errors
    #[error("Update source error: {0}")]
    Updates(String),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Feedgate operations.
pub type Result<T> = std::result::Result<T, FeedgateError>;
