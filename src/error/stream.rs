//! Streaming-related error types.
//!
//! This module defines transport errors raised while reading the
//! progress feed body. Any of them ends the session as `Failed`.

use std::fmt;
use std::time::Duration;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Stream connection was lost unexpectedly.
    ConnectionLost {
        message: String,
    },

    /// No chunk arrived within the idle window.
    Timeout {
        duration_secs: u64,
    },

    /// Generic read failure.
    Other {
        message: String,
    },
}

impl StreamError {
    /// Idle timeout for the given window.
    pub fn idle_timeout(window: Duration) -> Self {
        StreamError::Timeout {
            duration_secs: window.as_secs(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::ConnectionLost { .. } => {
                "Connection to the server was lost before the job finished.".to_string()
            }
            StreamError::Timeout { duration_secs } => {
                format!(
                    "No progress from the server for {} seconds. The connection may have been lost.",
                    duration_secs
                )
            }
            StreamError::Other { message } => {
                format!("Stream error: {}", message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::Timeout { .. } => "E_STREAM_TIMEOUT",
            StreamError::Other { .. } => "E_STREAM_OTHER",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::Timeout { duration_secs } => {
                write!(f, "Stream timeout after {} seconds", duration_secs)
            }
            StreamError::Other { message } => {
                write!(f, "Stream error: {}", message)
            }
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StreamError::Timeout { duration_secs: 0 }
        } else if err.is_body() || err.is_connect() || err.is_request() {
            StreamError::ConnectionLost {
                message: err.to_string(),
            }
        } else {
            StreamError::Other {
                message: err.to_string(),
            }
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => StreamError::Timeout { duration_secs: 0 },
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => StreamError::ConnectionLost {
                message: err.to_string(),
            },
            _ => StreamError::Other {
                message: err.to_string(),
            },
        }
    }
}
