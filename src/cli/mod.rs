//! CLI module for jobfeed.
//!
//! Argument parsing, version display and the run command.
//!
//! # Usage
//!
//! ```ignore
//! use jobfeed::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("{}", version_line()),
//!     CliCommand::Help => print_usage(std::io::stdout())?,
//!     CliCommand::Run(args) => { /* run_generation(...) */ }
//! }
//! ```

pub mod args;
pub mod run;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, JobDescription, RunArgs, USAGE};
pub use run::{
    build_request, print_usage, resolve_config, run_generation, EXIT_COMPLETED, EXIT_FAILED,
    EXIT_INTERRUPTED,
};
pub use version::{version_line, VERSION};
