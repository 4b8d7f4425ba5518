//! Per-job session state.
//!
//! A session tracks the latest stage/message/progress reported by the
//! backend and a write-once terminal outcome. It is owned by a single
//! driver and never shared across jobs.

mod machine;
mod snapshot;

pub use machine::{StreamSession, TerminalOutcome, Transition};
pub use snapshot::{SessionPhase, SessionSnapshot};
