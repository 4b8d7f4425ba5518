//! `jobfeed --version` output.

/// Crate version baked in at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The line printed for `--version`, e.g. `jobfeed 0.1.0`.
pub fn version_line() -> String {
    format!("jobfeed {}", VERSION)
}
