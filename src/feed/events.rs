//! Stage update types and definitions
//!
//! Contains the StageUpdate decoded from each event line of the
//! generation progress feed.

use serde::Serialize;

/// Stage name the backend uses for the successful terminal update.
pub const COMPLETE_STAGE: &str = "complete";

/// Stage name the backend uses for the failing terminal update.
pub const ERROR_STAGE: &str = "error";

/// What a stage update means for the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UpdateKind {
    /// Plain progress report, no payload
    Progress,
    /// Job finished; carries the opaque result payload
    Completed(serde_json::Value),
    /// Job failed; carries the backend's reason
    Failed(String),
}

/// One decoded update from the progress feed.
///
/// `stage` is an open vocabulary ("setup", "generating", "evaluating", ...)
/// and is treated as opaque here. Interpretation is left to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageUpdate {
    pub stage: String,
    pub message: String,
    /// Always within 0..=100
    pub progress: u8,
    pub kind: UpdateKind,
}

impl StageUpdate {
    /// Create a plain progress update.
    pub fn progress(stage: impl Into<String>, message: impl Into<String>, progress: u8) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            progress: progress.min(100),
            kind: UpdateKind::Progress,
        }
    }

    /// Create a completion update carrying the result payload.
    pub fn completed(message: impl Into<String>, progress: u8, data: serde_json::Value) -> Self {
        Self {
            stage: COMPLETE_STAGE.to_string(),
            message: message.into(),
            progress: progress.min(100),
            kind: UpdateKind::Completed(data),
        }
    }

    /// Create a failure update carrying the failure reason.
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            stage: ERROR_STAGE.to_string(),
            message: message.into(),
            progress: 0,
            kind: UpdateKind::Failed(error.into()),
        }
    }

    /// Whether this update ends the session.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, UpdateKind::Progress)
    }

    /// The completion payload, if this is a completion.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match &self.kind {
            UpdateKind::Completed(data) => Some(data),
            _ => None,
        }
    }

    /// The failure reason, if this is a failure.
    pub fn error(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Represents a classified feed line
#[derive(Debug, Clone, PartialEq)]
pub enum FeedLine {
    /// Event payload (the text after "data: ")
    Data(String),
    /// Empty line
    Empty,
    /// Comment/keep-alive line (starts with ':')
    Comment(String),
    /// Anything else; ignored
    Other(String),
}

/// Errors that can occur while parsing a single event line.
///
/// These are soft errors: the offending line is dropped and the stream
/// keeps going.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedParseError {
    /// Payload is not valid JSON
    InvalidJson { source: String },
    /// Payload is JSON but not a stage update (missing/mistyped fields)
    InvalidShape { source: String },
    /// `complete` stage without a `data` payload
    MissingCompletionData,
    /// `complete` stage whose `data` is not a JSON object
    InvalidCompletionData { found: &'static str },
    /// `error` stage without an `error` reason, or a blank one
    MissingErrorReason,
    /// Update carries both `data` and `error`
    ConflictingOutcome { stage: String },
}

impl FeedParseError {
    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            FeedParseError::InvalidJson { .. } => "E_FEED_JSON",
            FeedParseError::InvalidShape { .. } => "E_FEED_SHAPE",
            FeedParseError::MissingCompletionData => "E_FEED_NO_DATA",
            FeedParseError::InvalidCompletionData { .. } => "E_FEED_BAD_DATA",
            FeedParseError::MissingErrorReason => "E_FEED_NO_REASON",
            FeedParseError::ConflictingOutcome { .. } => "E_FEED_CONFLICT",
        }
    }

    /// Whether the backend sent a terminal stage we refused to trust.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            FeedParseError::MissingCompletionData
                | FeedParseError::InvalidCompletionData { .. }
                | FeedParseError::MissingErrorReason
                | FeedParseError::ConflictingOutcome { .. }
        )
    }
}

impl std::fmt::Display for FeedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedParseError::InvalidJson { source } => {
                write!(f, "Invalid JSON in event payload: {}", source)
            }
            FeedParseError::InvalidShape { source } => {
                write!(f, "Event payload is not a stage update: {}", source)
            }
            FeedParseError::MissingCompletionData => {
                write!(f, "Stage '{}' received without a data payload", COMPLETE_STAGE)
            }
            FeedParseError::InvalidCompletionData { found } => {
                write!(
                    f,
                    "Stage '{}' data must be an object, got {}",
                    COMPLETE_STAGE, found
                )
            }
            FeedParseError::MissingErrorReason => {
                write!(f, "Stage '{}' received without an error reason", ERROR_STAGE)
            }
            FeedParseError::ConflictingOutcome { stage } => {
                write!(f, "Stage '{}' carries both data and error", stage)
            }
        }
    }
}

impl std::error::Error for FeedParseError {}
