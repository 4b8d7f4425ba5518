//! The `jobfeed` run command: submit a job and follow it to the end.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tokio_util::sync::CancellationToken;

use crate::cli::args::{JobDescription, RunArgs};
use crate::cli_output::ProgressPrinter;
use crate::client::JobSubmitter;
use crate::config::FeedConfig;
use crate::driver::{FeedReport, StreamDriver};
use crate::models::{GenerateRequest, GenerationResult};
use crate::session::TerminalOutcome;
use crate::storage;

/// Exit code for a completed job.
pub const EXIT_COMPLETED: i32 = 0;
/// Exit code for a failed job or a run that could not start.
pub const EXIT_FAILED: i32 = 1;
/// Exit code after Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Environment config overlaid with command-line overrides.
pub fn resolve_config(args: &RunArgs, base: FeedConfig) -> FeedConfig {
    let mut config = base;
    if let Some(url) = &args.url {
        config = config.with_base_url(url.clone());
    }
    if let Some(username) = &args.username {
        config = config.with_username(username.clone());
    }
    if let Some(idle_timeout) = args.idle_timeout {
        config = config.with_idle_timeout(idle_timeout);
    }
    config
}

/// Build the job request, reading the job description file if one was given.
pub fn build_request(args: &RunArgs, config: &FeedConfig) -> Result<GenerateRequest> {
    let jd_text = match &args.job_description {
        JobDescription::File(path) => read_job_description(path)?,
        JobDescription::Inline(text) => text.clone(),
    };
    let request = GenerateRequest::new(&config.username, jd_text, &args.company, &args.role)
        .with_optimize(args.optimize);

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(eyre!("Missing required fields: {}", missing.join(", ")));
    }
    Ok(request)
}

fn read_job_description(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err(format!("Failed to read job description from {:?}", path))
}

/// Submit the job and drive its feed to a terminal outcome.
///
/// Progress goes to stderr. The completion payload goes to `args.output`
/// when set, otherwise to `stdout`. Returns the process exit code.
pub async fn run_generation<J, W>(
    submitter: &J,
    args: &RunArgs,
    config: &FeedConfig,
    cancel: CancellationToken,
    stdout: W,
) -> Result<i32>
where
    J: JobSubmitter,
    W: Write,
{
    let request = build_request(args, config)?;
    let mut printer = ProgressPrinter::stderr();
    printer.header(&format!("GENERATING: {} @ {}", request.role, request.company));

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(EXIT_INTERRUPTED),
        body = submitter.start(&request) => body,
    };
    let body = body.map_err(|e| eyre!("{} [{}]", e.user_message(), e.error_code()))?;

    let mut outcome = None;
    let report: FeedReport = StreamDriver::from_config(config)
        .with_cancellation(cancel)
        .run(body, |snapshot| printer.update(snapshot), |terminal| outcome = Some(terminal))
        .await;

    tracing::debug!(
        updates = report.updates_applied,
        parse_errors = report.parse_errors,
        ignored = report.ignored_lines,
        late_terminal = report.late_terminal_events,
        "Feed finished"
    );

    match outcome {
        None => {
            eprintln!("\nInterrupted");
            Ok(EXIT_INTERRUPTED)
        }
        Some(TerminalOutcome::Completed(payload)) => {
            printer.success(GenerationResult::from_payload(&payload).as_ref());
            match &args.output {
                Some(path) => {
                    storage::save_result(&payload, path)?;
                    eprintln!("Saved result to {}", path.display());
                }
                None => storage::write_result(&payload, stdout)?,
            }
            Ok(EXIT_COMPLETED)
        }
        Some(TerminalOutcome::Failed(reason)) => {
            printer.failure(&reason);
            Ok(EXIT_FAILED)
        }
    }
}

/// Print `--help` text.
pub fn print_usage<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "{}", crate::cli::args::USAGE)
}
