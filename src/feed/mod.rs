//! Progress feed decoding and parsing
//!
//! The generation backend reports job progress as a line-delimited stream:
//! - `data: <json>` - a stage update payload on a single line
//! - Empty lines and keep-alive/comment lines - ignored
//!
//! # Module structure
//! - `decoder` - Incremental byte-to-line framing (FrameDecoder)
//! - `events` - StageUpdate, FeedLine and FeedParseError definitions
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Line classification and stage update parsing

mod decoder;
mod events;
mod parser;
mod payloads;

pub use decoder::FrameDecoder;
pub use events::{
    FeedLine, FeedParseError, StageUpdate, UpdateKind, COMPLETE_STAGE, ERROR_STAGE,
};
pub use parser::{parse_feed_line, parse_stage_update, FeedParser, EVENT_PREFIX};
