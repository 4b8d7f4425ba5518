//! Observable view of a session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle phase of a session.
///
/// `Pending -> InProgress -> {Completed | Failed}`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Failed)
    }
}

/// Point-in-time copy of session state handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub stage: String,
    pub message: String,
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Snapshot of a session that has not received any event yet.
    pub fn pending(session_id: Uuid) -> Self {
        Self {
            session_id,
            phase: SessionPhase::Pending,
            stage: String::new(),
            message: String::new(),
            progress: 0,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_snapshot_is_empty() {
        let id = Uuid::new_v4();
        let snapshot = SessionSnapshot::pending(id);
        assert_eq!(snapshot.session_id, id);
        assert_eq!(snapshot.phase, SessionPhase::Pending);
        assert!(snapshot.stage.is_empty());
        assert!(snapshot.message.is_empty());
        assert_eq!(snapshot.progress, 0);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!SessionPhase::Pending.is_terminal());
        assert!(!SessionPhase::InProgress.is_terminal());
        assert!(SessionPhase::Completed.is_terminal());
        assert!(SessionPhase::Failed.is_terminal());
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&SessionPhase::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_snapshot_serializes_session_id_as_string() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(SessionSnapshot::pending(id)).unwrap();
        assert_eq!(value["session_id"], serde_json::json!(id.to_string()));
        assert_eq!(value["phase"], "pending");
    }
}
