//! Error types for jobfeed.
//!
//! - **NetworkError**: submitting a job failed before a feed existed
//! - **StreamError**: reading the feed body failed mid-stream
//!
//! Per-line parse problems are not errors at this level; see
//! [`crate::feed::FeedParseError`]. They are counted and logged by the
//! driver and never end a session.
//!
//! | Error | Ends session | Surfaces as |
//! |-------|--------------|-------------|
//! | NetworkError | no session started | `Err` from `JobSubmitter::start` |
//! | StreamError | yes | `TerminalOutcome::Failed` |
//! | FeedParseError | no | `FeedReport::parse_errors` |

mod network;
mod stream;

pub use network::{classify_reqwest_error, NetworkError};
pub use stream::StreamError;
