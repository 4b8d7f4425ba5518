//! Command-line argument parsing for the jobfeed CLI.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Usage text printed by `--help` and on argument errors.
pub const USAGE: &str = "\
Usage: jobfeed --company <NAME> --role <TITLE> (--jd <FILE> | --jd-text <TEXT>) [OPTIONS]

Options:
  --company <NAME>         Company the resume is tailored for
  --role <TITLE>           Role title
  --jd <FILE>              Read the job description from FILE
  --jd-text <TEXT>         Job description given inline
  --url <URL>              Backend base URL (env: JOBFEED_URL)
  --username <NAME>        Username sent with the job (env: JOBFEED_USERNAME)
  --output <PATH>          Save the result JSON to PATH instead of stdout
  --no-optimize            Skip the evaluation and fact-check loops
  --idle-timeout <SECS>    Give up after SECS without data, 0 to wait forever
                           (env: JOBFEED_IDLE_TIMEOUT_SECS)
  -v, --verbose            Debug logging on stderr
  -V, --version            Print version
  -h, --help               Print this help";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Submit a job and follow its progress
    Run(RunArgs),
}

/// Where the job description comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDescription {
    File(PathBuf),
    Inline(String),
}

/// Arguments for a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub company: String,
    pub role: String,
    pub job_description: JobDescription,
    pub url: Option<String>,
    pub username: Option<String>,
    pub output: Option<PathBuf>,
    pub optimize: bool,
    /// `Some(None)` means the flag was given as 0 (no idle timeout)
    pub idle_timeout: Option<Option<Duration>>,
    pub verbose: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Missing required argument {0}")]
    MissingRequired(&'static str),

    #[error("--jd and --jd-text cannot be used together")]
    ConflictingJobDescription,

    #[error("Invalid value for {flag}: {value:?}")]
    InvalidValue { flag: &'static str, value: String },
}

/// Parse command-line arguments and return the command to execute.
///
/// `--version` and `--help` in flag position win over everything else,
/// including errors in other arguments. The same tokens given as an
/// option's value are taken as that value.
///
/// # Examples
///
/// ```
/// use jobfeed::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["jobfeed".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let args: Vec<String> = args.skip(1).collect();

    let mut flags = args.iter();
    while let Some(arg) = flags.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            flag if takes_value(flag) => {
                // The next token is this flag's value, not a flag
                flags.next();
            }
            _ => {}
        }
    }

    let mut company = None;
    let mut role = None;
    let mut jd_file = None;
    let mut jd_text = None;
    let mut url = None;
    let mut username = None;
    let mut output = None;
    let mut optimize = true;
    let mut idle_timeout = None;
    let mut verbose = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--company" => company = Some(value(&mut iter, "--company")?),
            "--role" => role = Some(value(&mut iter, "--role")?),
            "--jd" => jd_file = Some(PathBuf::from(value(&mut iter, "--jd")?)),
            "--jd-text" => jd_text = Some(value(&mut iter, "--jd-text")?),
            "--url" => url = Some(value(&mut iter, "--url")?),
            "--username" => username = Some(value(&mut iter, "--username")?),
            "--output" | "-o" => output = Some(PathBuf::from(value(&mut iter, "--output")?)),
            "--no-optimize" => optimize = false,
            "--idle-timeout" => {
                let raw = value(&mut iter, "--idle-timeout")?;
                let secs = raw.trim().parse::<u64>().map_err(|_| ArgsError::InvalidValue {
                    flag: "--idle-timeout",
                    value: raw.clone(),
                })?;
                idle_timeout = Some((secs > 0).then(|| Duration::from_secs(secs)));
            }
            "--verbose" | "-v" => verbose = true,
            _ => return Err(ArgsError::UnknownArgument(arg)),
        }
    }

    let job_description = match (jd_file, jd_text) {
        (Some(_), Some(_)) => return Err(ArgsError::ConflictingJobDescription),
        (Some(path), None) => JobDescription::File(path),
        (None, Some(text)) => JobDescription::Inline(text),
        (None, None) => return Err(ArgsError::MissingRequired("--jd or --jd-text")),
    };

    Ok(CliCommand::Run(RunArgs {
        company: company.ok_or(ArgsError::MissingRequired("--company"))?,
        role: role.ok_or(ArgsError::MissingRequired("--role"))?,
        job_description,
        url,
        username,
        output,
        optimize,
        idle_timeout,
        verbose,
    }))
}

fn takes_value(flag: &str) -> bool {
    matches!(
        flag,
        "--company"
            | "--role"
            | "--jd"
            | "--jd-text"
            | "--url"
            | "--username"
            | "--output"
            | "-o"
            | "--idle-timeout"
    )
}

fn value<I>(iter: &mut I, flag: &'static str) -> Result<String, ArgsError>
where
    I: Iterator<Item = String>,
{
    iter.next().ok_or(ArgsError::MissingValue(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, ArgsError> {
        let args: Vec<String> = std::iter::once("jobfeed")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        parse_args(args.into_iter())
    }

    fn run_args(args: &[&str]) -> RunArgs {
        match parse(args) {
            Ok(CliCommand::Run(run)) => run,
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["--help"]), Ok(CliCommand::Help));
        assert_eq!(parse(&["-h"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_version_wins_over_bad_args() {
        assert_eq!(parse(&["--bogus", "--version"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_flag_like_option_values_are_values() {
        let run = run_args(&["--company", "Acme", "--role", "Eng", "--jd-text", "-h"]);
        assert_eq!(run.job_description, JobDescription::Inline("-h".to_string()));

        let run = run_args(&["--company", "-V", "--role", "--help", "--jd", "f"]);
        assert_eq!(run.company, "-V");
        assert_eq!(run.role, "--help");
    }

    #[test]
    fn test_parse_minimal_run() {
        let run = run_args(&["--company", "Acme", "--role", "Engineer", "--jd", "jd.txt"]);
        assert_eq!(run.company, "Acme");
        assert_eq!(run.role, "Engineer");
        assert_eq!(run.job_description, JobDescription::File(PathBuf::from("jd.txt")));
        assert!(run.optimize);
        assert_eq!(run.idle_timeout, None);
        assert_eq!(run.output, None);
        assert!(!run.verbose);
    }

    #[test]
    fn test_parse_all_options() {
        let run = run_args(&[
            "--company",
            "Acme",
            "--role",
            "Engineer",
            "--jd-text",
            "Build things",
            "--url",
            "http://gen:9000",
            "--username",
            "sam",
            "--output",
            "out/result.json",
            "--no-optimize",
            "--idle-timeout",
            "30",
            "-v",
        ]);
        assert_eq!(run.job_description, JobDescription::Inline("Build things".to_string()));
        assert_eq!(run.url.as_deref(), Some("http://gen:9000"));
        assert_eq!(run.username.as_deref(), Some("sam"));
        assert_eq!(run.output, Some(PathBuf::from("out/result.json")));
        assert!(!run.optimize);
        assert_eq!(run.idle_timeout, Some(Some(Duration::from_secs(30))));
        assert!(run.verbose);
    }

    #[test]
    fn test_zero_idle_timeout_disables() {
        let run = run_args(&["--company", "A", "--role", "R", "--jd", "f", "--idle-timeout", "0"]);
        assert_eq!(run.idle_timeout, Some(None));
    }

    #[test]
    fn test_invalid_idle_timeout() {
        assert_eq!(
            parse(&["--company", "A", "--role", "R", "--jd", "f", "--idle-timeout", "soon"]),
            Err(ArgsError::InvalidValue {
                flag: "--idle-timeout",
                value: "soon".to_string()
            })
        );
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(parse(&["--company"]), Err(ArgsError::MissingValue("--company")));
    }

    #[test]
    fn test_missing_required() {
        assert_eq!(
            parse(&["--role", "R", "--jd", "f"]),
            Err(ArgsError::MissingRequired("--company"))
        );
        assert_eq!(
            parse(&["--company", "A", "--role", "R"]),
            Err(ArgsError::MissingRequired("--jd or --jd-text"))
        );
    }

    #[test]
    fn test_conflicting_job_description() {
        assert_eq!(
            parse(&["--company", "A", "--role", "R", "--jd", "f", "--jd-text", "t"]),
            Err(ArgsError::ConflictingJobDescription)
        );
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownArgument("--unknown".to_string()))
        );
    }
}
