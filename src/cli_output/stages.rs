//! Stage name classification.
//!
//! The backend's stage vocabulary is open ("evaluation_passed",
//! "revising_factuality", ...), so classification is by substring.

/// Coarse family a stage name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Setup,
    Generating,
    Evaluating,
    Revising,
    Factuality,
    Finalizing,
    Complete,
    Error,
    Other,
}

impl StageKind {
    /// Classify a backend stage name.
    pub fn classify(stage: &str) -> Self {
        // Order matters: "revising_evaluation" contains "evaluat" and
        // "revising_factuality" contains "factuality"
        if stage.contains("error") {
            StageKind::Error
        } else if stage.contains("complete") {
            StageKind::Complete
        } else if stage.contains("setup") {
            StageKind::Setup
        } else if stage.contains("revising") {
            StageKind::Revising
        } else if stage.contains("generat") {
            StageKind::Generating
        } else if stage.contains("evaluat") {
            StageKind::Evaluating
        } else if stage.contains("factuality") {
            StageKind::Factuality
        } else if stage.contains("saving") || stage.contains("rendering") {
            StageKind::Finalizing
        } else {
            StageKind::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StageKind::Setup => "Setting up",
            StageKind::Generating => "Generating",
            StageKind::Evaluating => "Evaluating",
            StageKind::Revising => "Revising",
            StageKind::Factuality => "Checking facts",
            StageKind::Finalizing => "Finalizing",
            StageKind::Complete => "Complete",
            StageKind::Error => "Error",
            StageKind::Other => "Working",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            StageKind::Setup => "⚙",
            StageKind::Generating => "✎",
            StageKind::Evaluating => "◎",
            StageKind::Revising => "↻",
            StageKind::Factuality => "✔",
            StageKind::Finalizing => "⬇",
            StageKind::Complete => "✓",
            StageKind::Error => "✗",
            StageKind::Other => "•",
        }
    }
}

/// One entry of the step checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub label: &'static str,
    pub active: bool,
    pub completed: bool,
}

/// Checklist state for the current stage and progress.
///
/// A step counts as done once progress passes its threshold, independent
/// of the stage name.
pub fn milestones(stage: &str, progress: u8) -> Vec<Milestone> {
    let kind = StageKind::classify(stage);
    let steps: [(&'static str, bool, u8); 5] = [
        ("Setup", kind == StageKind::Setup, 5),
        ("Generate", kind == StageKind::Generating, 25),
        ("Evaluate", kind == StageKind::Evaluating, 50),
        ("Fact-check", kind == StageKind::Factuality, 80),
        ("Finalize", kind == StageKind::Finalizing, 95),
    ];
    steps
        .into_iter()
        .map(|(label, active, threshold)| Milestone {
            label,
            active,
            completed: progress > threshold,
        })
        .collect()
}
