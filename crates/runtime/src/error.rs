//! Error type shared by the runtime services

use thiserror::Error;

/// Errors produced while talking to the Glia API or managing local state
#[derive(Debug, Error)]
pub enum GliaError {
    /// Missing or unreadable local configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token exchange failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Invalid input supplied by the caller
    #[error("{0}")]
    Validation(String),

    /// The API answered with a non-success status
    #[error("API request failed with status {status}: {body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A deployment task ended in a non-completed state
    #[error("deployment task ended with status '{status}': {detail}")]
    TaskFailed {
        /// Terminal status reported by the task
        status: String,
        /// Human readable detail
        detail: String,
    },

    /// Polling gave up before the task left `processing`
    #[error("deployment task still processing after {attempts} polls")]
    PollTimeout {
        /// Number of polls performed
        attempts: u32,
    },

    /// A date string did not match any accepted format
    #[error("invalid date format: '{input}'")]
    DateParse {
        /// The rejected input
        input: String,
    },

    /// The operation was interrupted
    #[error("operation cancelled")]
    Cancelled,

    /// Network level failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local IO failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GliaError {
    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Build a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true when the error represents an interruption
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The remote body decoded as JSON, when it is JSON
    pub fn remote_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Remote { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

/// Result alias used throughout the runtime crate
pub type Result<T, E = GliaError> = std::result::Result<T, E>;
