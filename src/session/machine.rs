//! Stage state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::feed::{StageUpdate, UpdateKind};
use crate::session::snapshot::{SessionPhase, SessionSnapshot};

/// Final result of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum TerminalOutcome {
    /// Job finished with the backend's result payload
    Completed(serde_json::Value),
    /// Job failed, or the stream ended before it finished
    Failed(String),
}

impl TerminalOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TerminalOutcome::Completed(_))
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            TerminalOutcome::Completed(data) => Some(data),
            TerminalOutcome::Failed(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TerminalOutcome::Completed(_) => None,
            TerminalOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Result of applying one update to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Non-terminal update accepted; stage/message/progress overwritten
    Progressed,
    /// First terminal update; the session is now inert
    Terminated(TerminalOutcome),
    /// Session was already terminal. `late_terminal` marks a second
    /// completion/failure as opposed to a stray progress update.
    Ignored { late_terminal: bool },
}

/// Mutable state of one job's progress feed.
#[derive(Debug, Clone)]
pub struct StreamSession {
    id: Uuid,
    phase: SessionPhase,
    stage: String,
    message: String,
    progress: u8,
    outcome: Option<TerminalOutcome>,
    updated_at: DateTime<Utc>,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    /// Create a session in the `Pending` phase.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            phase: SessionPhase::Pending,
            stage: String::new(),
            message: String::new(),
            progress: 0,
            outcome: None,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&TerminalOutcome> {
        self.outcome.as_ref()
    }

    /// Apply a parsed update.
    ///
    /// Progress is last-write-wins: a lower value than the previous one is
    /// accepted as-is.
    pub fn apply(&mut self, update: StageUpdate) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored {
                late_terminal: update.is_terminal(),
            };
        }

        self.stage = update.stage;
        self.message = update.message;
        self.progress = update.progress;
        self.updated_at = Utc::now();

        match update.kind {
            UpdateKind::Progress => {
                self.phase = SessionPhase::InProgress;
                Transition::Progressed
            }
            UpdateKind::Completed(data) => self.terminate(TerminalOutcome::Completed(data)),
            UpdateKind::Failed(reason) => self.terminate(TerminalOutcome::Failed(reason)),
        }
    }

    /// Force a failure that did not come from the feed (transport loss,
    /// stream closed early). Stage/message/progress are left untouched.
    pub fn fail(&mut self, reason: impl Into<String>) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored {
                late_terminal: true,
            };
        }
        self.updated_at = Utc::now();
        self.terminate(TerminalOutcome::Failed(reason.into()))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            stage: self.stage.clone(),
            message: self.message.clone(),
            progress: self.progress,
            updated_at: self.updated_at,
        }
    }

    fn terminate(&mut self, outcome: TerminalOutcome) -> Transition {
        self.phase = if outcome.is_completed() {
            SessionPhase::Completed
        } else {
            SessionPhase::Failed
        };
        self.outcome = Some(outcome.clone());
        Transition::Terminated(outcome)
    }
}
