//! Error handling module
//!
//! This module provides unified error handling for the suite-runner library.

use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum Error {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// A `(suite, test)` name pair was registered twice
    #[error("Duplicate test: {suite}.{test} is already registered")]
    DuplicateTest { suite: String, test: String },
    /// Operation not allowed in the current run state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create an invalid state error with a custom message
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Error::InvalidState(message.into())
    }
}
