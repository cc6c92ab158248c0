//! Tapestry CLI — error types.

use tapestry_content::ContentError;
use tapestry_core::error::EngineError;
use thiserror::Error;

/// Startup and runtime errors of the terminal player.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configuration file or option is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The content document could not be loaded.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Playback failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
