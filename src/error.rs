//! Application error types.

use thiserror::Error;

/// Application-level errors for orbitview.
#[derive(Error, Debug)]
pub enum AppError {
    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    // Game server errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Game server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Identity errors
    #[error("Not signed in")]
    NotSignedIn,

    // Domain errors
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Celestial body not found: {0}")]
    BodyNotFound(String),

    // State feed errors
    #[error("State feed error: {0}")]
    Feed(String),
}

/// Result alias used throughout the library.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
