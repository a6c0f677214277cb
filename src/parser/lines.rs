//! Reassembly of complete lines from arbitrarily chunked tracer output.

use log::{debug, warn};

/// Turns a stream of byte chunks into complete, newline-terminated lines
///
/// Bytes after the last `\n` are held until a later chunk completes them.
/// Each finished line is decoded as UTF-8 on its own; a line that fails to
/// decode is dropped without disturbing its neighbours.
#[derive(Debug, Default)]
pub struct LineReassembler {
    partial: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line it completes (in order)
    ///
    /// Returned lines do not include the terminator.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk.as_ref();

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            rest = &rest[pos + 1..];

            let raw = std::mem::take(&mut self.partial);
            match String::from_utf8(raw) {
                Ok(line) => lines.push(line),
                Err(e) => warn!("Dropping undecodable trace line: {}", e),
            }
        }

        self.partial.extend_from_slice(rest);
        lines
    }

    /// Bytes held for the current unterminated line
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Drop any unterminated tail
    ///
    /// Called when the tracer exits; a half-written line is never parsed.
    pub fn finish(&mut self) {
        if !self.partial.is_empty() {
            debug!("Discarding {} bytes of unterminated output", self.partial.len());
            self.partial.clear();
        }
    }
}
