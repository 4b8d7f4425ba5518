//! Incremental line framing for the progress feed
//!
//! Bytes arrive in arbitrary network chunks. A chunk may end in the middle
//! of a line, a JSON object, or a multi-byte UTF-8 character, so both the
//! undecoded byte tail and the undelimited text tail are carried over to
//! the next call.

/// Stateful decoder turning raw byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence (at most 3)
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    buffer: String,
}

impl FrameDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, newline stripped.
    ///
    /// A trailing `\r` is stripped too. Invalid UTF-8 is replaced with
    /// U+FFFD rather than aborting.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_into_buffer(chunk);
        self.drain_lines()
    }

    /// Signal end of input and return the salvaged final line, if any.
    ///
    /// The decoder is empty afterwards and can be reused.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            self.pending_bytes.clear();
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Bytes and characters held back, waiting for more input.
    pub fn buffered_len(&self) -> usize {
        self.pending_bytes.len() + self.buffer.len()
    }

    fn decode_into_buffer(&mut self, chunk: &[u8]) {
        let joined;
        let mut input: &[u8] = if self.pending_bytes.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.pending_bytes);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.buffer.push_str(text);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk
                            self.pending_bytes.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].find('\n') {
            let end = consumed + offset;
            let line = self.buffer[consumed..end].trim_end_matches('\r');
            lines.push(line.to_string());
            consumed = end + 1;
        }
        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        lines
    }
}
