//! Simple line-based progress output.

use std::io::{self, Write};

use crate::cli_output::stages::{milestones, StageKind};
use crate::models::GenerationResult;
use crate::session::SessionSnapshot;

/// Line width for separators.
const LINE_WIDTH: usize = 60;

/// Cells in the progress bar.
const BAR_WIDTH: usize = 20;

/// Status icons
pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const FAILURE: &str = "✗";
    pub const PENDING: &str = "○";
    pub const ACTIVE: &str = "●";
}

/// Render a fixed-width progress bar.
///
/// ```
/// use jobfeed::cli_output::progress_bar;
///
/// assert_eq!(progress_bar(50, 10), "[#####.....]");
/// ```
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (progress.min(100) as usize * width) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// One progress line for a snapshot.
///
/// ```text
/// [#########...........]  45%  ◎ Evaluating  Evaluating resume (iteration 2)...
/// ```
pub fn format_progress_line(snapshot: &SessionSnapshot) -> String {
    let kind = StageKind::classify(&snapshot.stage);
    format!(
        "{} {:>3}%  {} {}  {}",
        progress_bar(snapshot.progress, BAR_WIDTH),
        snapshot.progress,
        kind.icon(),
        kind.label(),
        snapshot.message
    )
}

/// Checklist line, e.g. `✓ Setup  ✓ Generate  ● Evaluate  ○ Fact-check  ○ Finalize`.
pub fn format_milestones(snapshot: &SessionSnapshot) -> String {
    milestones(&snapshot.stage, snapshot.progress)
        .iter()
        .map(|m| {
            let icon = if m.completed {
                icons::SUCCESS
            } else if m.active {
                icons::ACTIVE
            } else {
                icons::PENDING
            };
            format!("{} {}", icon, m.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Prints progress to a writer, skipping repeats of the previous line.
pub struct ProgressPrinter<W: Write> {
    out: W,
    last_line: Option<String>,
    last_stage_kind: Option<StageKind>,
}

impl ProgressPrinter<io::Stderr> {
    /// Printer writing to stderr (stdout is reserved for result JSON).
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_line: None,
            last_stage_kind: None,
        }
    }

    /// Print the header.
    ///
    /// ```text
    /// GENERATING: Software Engineer Intern @ Google
    /// ════════════════════════════════════════════════════════════
    /// ```
    pub fn header(&mut self, title: &str) {
        let _ = writeln!(self.out, "{}", title);
        let _ = writeln!(self.out, "{}", "═".repeat(LINE_WIDTH));
    }

    /// Print a snapshot if it differs from the last one printed.
    pub fn update(&mut self, snapshot: &SessionSnapshot) {
        let line = format_progress_line(snapshot);
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        let kind = StageKind::classify(&snapshot.stage);
        if self.last_stage_kind != Some(kind) {
            let _ = writeln!(self.out, "  {}", format_milestones(snapshot));
            self.last_stage_kind = Some(kind);
        }
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
        self.last_line = Some(line);
    }

    /// Print the success footer.
    pub fn success(&mut self, result: Option<&GenerationResult>) {
        let _ = writeln!(self.out, "{}", "═".repeat(LINE_WIDTH));
        let _ = writeln!(self.out, "{} GENERATION COMPLETE", icons::SUCCESS);
        if let Some(result) = result {
            if let Some(score) = result.evaluation_score() {
                let _ = writeln!(self.out, "  Score:     {}", score);
            }
            if let Some(job_id) = result.paths.job_id.as_deref() {
                let _ = writeln!(self.out, "  Job:       {}", job_id);
            }
            if let Some(docx) = result.paths.docx_path.as_deref() {
                let _ = writeln!(self.out, "  Document:  {}", docx);
            }
        }
        let _ = writeln!(self.out, "{}", "═".repeat(LINE_WIDTH));
    }

    /// Print the failure footer.
    pub fn failure(&mut self, reason: &str) {
        let _ = writeln!(self.out, "{}", "═".repeat(LINE_WIDTH));
        let _ = writeln!(self.out, "{} GENERATION FAILED", icons::FAILURE);
        let _ = writeln!(self.out, "  {}", reason);
        let _ = writeln!(self.out, "{}", "═".repeat(LINE_WIDTH));
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPhase;
    use uuid::Uuid;

    fn snapshot(stage: &str, message: &str, progress: u8) -> SessionSnapshot {
        SessionSnapshot {
            stage: stage.to_string(),
            message: message.to_string(),
            progress,
            phase: SessionPhase::InProgress,
            ..SessionSnapshot::pending(Uuid::nil())
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4), "[....]");
        assert_eq!(progress_bar(100, 4), "[####]");
        assert_eq!(progress_bar(255, 4), "[####]");
        assert_eq!(progress_bar(45, 20), "[#########...........]");
    }

    #[test]
    fn test_format_progress_line() {
        let line = format_progress_line(&snapshot("evaluating", "Evaluating resume...", 45));
        assert_eq!(
            line,
            "[#########...........]  45%  ◎ Evaluating  Evaluating resume..."
        );
    }

    #[test]
    fn test_format_milestones() {
        let line = format_milestones(&snapshot("evaluating", "", 30));
        assert_eq!(
            line,
            "✓ Setup  ✓ Generate  ● Evaluate  ○ Fact-check  ○ Finalize"
        );
    }

    #[test]
    fn test_printer_skips_duplicates_and_marks_stage_changes() {
        let mut printer = ProgressPrinter::new(Vec::new());
        printer.update(&snapshot("setup", "Starting", 5));
        printer.update(&snapshot("setup", "Starting", 5));
        printer.update(&snapshot("generating", "Writing", 10));

        let out = String::from_utf8(printer.into_inner()).unwrap();
        let progress_lines = out.lines().filter(|l| l.starts_with('[')).count();
        let checklist_lines = out.lines().filter(|l| l.starts_with("  ")).count();
        assert_eq!(progress_lines, 2);
        assert_eq!(checklist_lines, 2);
    }

    #[test]
    fn test_failure_footer() {
        let mut printer = ProgressPrinter::new(Vec::new());
        printer.failure("stream ended without a terminal event");
        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert!(out.contains("✗ GENERATION FAILED"));
        assert!(out.contains("stream ended without a terminal event"));
    }
}
