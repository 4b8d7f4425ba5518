//! Feed line parsing logic
//!
//! Classifies decoded lines and turns `data: ` lines into StageUpdates.

use crate::feed::events::{
    FeedLine, FeedParseError, StageUpdate, UpdateKind, COMPLETE_STAGE, ERROR_STAGE,
};
use crate::feed::payloads::StagePayload;

/// Literal prefix of an event-bearing line.
pub const EVENT_PREFIX: &str = "data: ";

/// Classify a single decoded line
pub fn parse_feed_line(line: &str) -> FeedLine {
    if line.is_empty() {
        return FeedLine::Empty;
    }

    if let Some(payload) = line.strip_prefix(EVENT_PREFIX) {
        return FeedLine::Data(payload.to_string());
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return FeedLine::Comment(stripped.trim().to_string());
    }

    FeedLine::Other(line.to_string())
}

/// Parse an event payload (the text after `data: `) into a StageUpdate.
///
/// Terminal stages are only trusted when complete: `complete` needs an
/// object `data` and `error` needs a non-blank `error` string. A `data` field on a
/// non-complete stage, or an `error` field on a non-error stage, is ignored.
pub fn parse_stage_update(payload: &str) -> Result<StageUpdate, FeedParseError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| FeedParseError::InvalidJson {
            source: e.to_string(),
        })?;
    let payload: StagePayload =
        serde_json::from_value(value).map_err(|e| FeedParseError::InvalidShape {
            source: e.to_string(),
        })?;

    let progress = payload.clamped_progress();
    let is_terminal_stage = payload.stage == COMPLETE_STAGE || payload.stage == ERROR_STAGE;
    if is_terminal_stage && payload.data.is_some() && payload.error.is_some() {
        return Err(FeedParseError::ConflictingOutcome {
            stage: payload.stage,
        });
    }

    let kind = match payload.stage.as_str() {
        COMPLETE_STAGE => match payload.data {
            Some(data) if data.is_object() => UpdateKind::Completed(data),
            Some(other) => {
                return Err(FeedParseError::InvalidCompletionData {
                    found: json_type_name(&other),
                })
            }
            None => return Err(FeedParseError::MissingCompletionData),
        },
        ERROR_STAGE => match payload.error {
            Some(reason) if !reason.trim().is_empty() => UpdateKind::Failed(reason),
            _ => return Err(FeedParseError::MissingErrorReason),
        },
        _ => UpdateKind::Progress,
    };

    Ok(StageUpdate {
        stage: payload.stage,
        message: payload.message,
        progress,
        kind,
    })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Line-at-a-time parser that keeps counts of what it skipped.
#[derive(Debug, Default)]
pub struct FeedParser {
    ignored_lines: u64,
}

impl FeedParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded line.
    ///
    /// Returns:
    /// - `Ok(Some(update))` - the line carried a valid stage update
    /// - `Ok(None)` - the line carries no event (blank, comment, other)
    /// - `Err(error)` - an event line that could not be trusted
    pub fn feed_line(&mut self, line: &str) -> Result<Option<StageUpdate>, FeedParseError> {
        match parse_feed_line(line) {
            FeedLine::Data(payload) => parse_stage_update(&payload).map(Some),
            FeedLine::Empty => Ok(None),
            FeedLine::Comment(_) | FeedLine::Other(_) => {
                self.ignored_lines += 1;
                Ok(None)
            }
        }
    }

    /// Non-empty lines skipped because they carried no event.
    pub fn ignored_lines(&self) -> u64 {
        self.ignored_lines
    }
}
