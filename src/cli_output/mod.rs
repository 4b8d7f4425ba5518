//! Line-based terminal output for job progress.
//!
//! This is the CLI's renderer: it maps the opaque stage names coming from
//! the backend onto labels, icons and a milestone checklist.

mod progress;
mod stages;

pub use progress::*;
pub use stages::{milestones, Milestone, StageKind};
