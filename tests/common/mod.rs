//! Common test utilities for integration tests.
//!
//! Builders for feed bodies and a recording harness around
//! [`StreamDriver::run`].

#![allow(dead_code)]

use std::cell::RefCell;

use futures::stream;
use jobfeed::driver::{FeedReport, StreamDriver};
use jobfeed::error::StreamError;
use jobfeed::session::{SessionSnapshot, TerminalOutcome};
use serde_json::{json, Value};

/// One `data: ` line for a progress event.
pub fn progress_line(stage: &str, message: &str, progress: u8) -> String {
    format!(
        "data: {}\n",
        json!({"stage": stage, "message": message, "progress": progress})
    )
}

/// One `data: ` line for the completion event.
pub fn complete_line(data: Value) -> String {
    format!(
        "data: {}\n",
        json!({"stage": "complete", "message": "Done", "progress": 100, "data": data})
    )
}

/// One `data: ` line for the error event.
pub fn error_line(error: &str) -> String {
    format!(
        "data: {}\n",
        json!({"stage": "error", "message": "Failed", "progress": 0, "error": error})
    )
}

/// A realistic successful job feed.
pub fn successful_feed() -> String {
    [
        progress_line("setup", "Starting resume generation...", 5),
        "\n".to_string(),
        progress_line("generating", "Generating resume with AI...", 15),
        "\n".to_string(),
        progress_line("evaluating", "Evaluating resume (iteration 1)...", 45),
        "\n".to_string(),
        progress_line("checking_factuality", "Checking factuality...", 70),
        "\n".to_string(),
        progress_line("saving", "Saving resume JSON...", 90),
        "\n".to_string(),
        complete_line(json!({
            "resume": {"name": "Ada"},
            "scores": {"evaluation": {"total_score": 82}, "factuality": {"passed": true}},
            "paths": {
                "json_path": "out/acme.json",
                "docx_path": "out/acme.docx",
                "job_id": "acme_engineer"
            }
        })),
        "\n".to_string(),
    ]
    .concat()
}

/// Everything the driver reported for one run.
#[derive(Debug)]
pub struct Recorded {
    pub updates: Vec<SessionSnapshot>,
    pub terminals: Vec<TerminalOutcome>,
    pub report: FeedReport,
}

impl Recorded {
    /// `(stage, message, progress)` of each update, for comparing runs.
    pub fn update_fields(&self) -> Vec<(String, String, u8)> {
        self.updates
            .iter()
            .map(|s| (s.stage.clone(), s.message.clone(), s.progress))
            .collect()
    }

    pub fn single_terminal(&self) -> &TerminalOutcome {
        assert_eq!(self.terminals.len(), 1, "expected exactly one terminal outcome");
        &self.terminals[0]
    }
}

/// Run a fresh driver over `chunks` and record every callback.
pub async fn drive_chunks(chunks: Vec<Result<Vec<u8>, StreamError>>) -> Recorded {
    drive_with(StreamDriver::new(), chunks).await
}

/// Run `driver` over `chunks` and record every callback.
pub async fn drive_with(
    driver: StreamDriver,
    chunks: Vec<Result<Vec<u8>, StreamError>>,
) -> Recorded {
    let updates = RefCell::new(Vec::new());
    let terminals = RefCell::new(Vec::new());
    let report = driver
        .run(
            stream::iter(chunks),
            |snapshot| updates.borrow_mut().push(snapshot.clone()),
            |outcome| terminals.borrow_mut().push(outcome),
        )
        .await;
    Recorded {
        updates: updates.into_inner(),
        terminals: terminals.into_inner(),
        report,
    }
}

/// Split `body` into chunks at the given byte offsets.
pub fn split_at(body: &[u8], offsets: &[usize]) -> Vec<Result<Vec<u8>, StreamError>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for &offset in offsets {
        chunks.push(Ok(body[start..offset].to_vec()));
        start = offset;
    }
    chunks.push(Ok(body[start..].to_vec()));
    chunks
}

/// Split `body` into chunks of `size` bytes.
pub fn chunked(body: &[u8], size: usize) -> Vec<Result<Vec<u8>, StreamError>> {
    body.chunks(size).map(|c| Ok(c.to_vec())).collect()
}
