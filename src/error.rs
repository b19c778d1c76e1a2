// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Fetching a page failed
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot or tracked file could not be read or written
    #[error("Persistence error for {path}: {message}")]
    Persistence { path: String, message: String },

    /// Chat transport rejected or failed a call
    #[error("Transport error: {0}")]
    Transport(String),

    /// Fetched content did not have the shape its parser expects
    #[error("Parse error: {0}")]
    Parse(String),

    /// An intake conversation ended in an unusable state
    #[error("Intake error: {0}")]
    Intake(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a path.
    pub fn persistence(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an intake error.
    pub fn intake(message: impl Into<String>) -> Self {
        Self::Intake(message.into())
    }

    /// Whether this error is a configuration problem that must stop the caller.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
