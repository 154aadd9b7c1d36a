//! Re-framing of fragmented sentence text.
//!
//! Radio notifications are limited to the link MTU, so a single sentence
//! usually arrives split over several notifications. [`LineAssembler`]
//! buffers the fragments and releases complete lines only.

use tracing::debug;

/// Default cap on buffered, not yet terminated text.
pub const DEFAULT_MAX_LINE_BUFFER: usize = 4096;

/// Buffers text fragments and yields complete newline-terminated lines.
#[derive(Debug)]
pub struct LineAssembler {
    buffer: String,
    max_len: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_LINE_BUFFER)
    }

    /// Create an assembler that drops its partial line beyond `max_len` bytes.
    pub fn with_capacity(max_len: usize) -> Self {
        Self {
            buffer: String::new(),
            max_len,
        }
    }

    /// Append a fragment and return every line it completed.
    ///
    /// Line terminators are stripped; empty lines are skipped.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let mut lines = Vec::new();
        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }

        if self.buffer.len() > self.max_len {
            debug!(
                buffered = self.buffer.len(),
                max = self.max_len,
                "Unterminated sentence text exceeds buffer, discarding"
            );
            self.buffer.clear();
        }

        lines
    }

    /// Bytes of partial line currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
