//! jobfeed - follow a long-running generation job through its progress feed
//!
//! This library exposes modules for use in the binary and integration tests.

pub mod cli;
pub mod cli_output;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod feed;
pub mod models;
pub mod session;
pub mod storage;
