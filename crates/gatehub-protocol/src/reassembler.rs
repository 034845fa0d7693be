//! Frame reassembly for the serial stream.
//!
//! The reader writes one JSON object per line, but the serial transport
//! delivers bytes at arbitrary boundaries: a read may hand the bridge half
//! an object, and the next read the other half. The [`FrameReassembler`]
//! turns that stream of lines back into complete JSON frames.
//!
//! # Algorithm
//!
//! For each line read from the port:
//!
//! 1. Try to parse the line standalone. Success means a complete frame; the
//!    pending buffer is untouched.
//! 2. On failure, append the line to the pending buffer and try to parse the
//!    buffer as a whole. Success empties the buffer and emits it as a frame.
//! 3. Otherwise the buffer keeps accumulating, unless it exceeds
//!    [`MAX_PENDING_FRAME_CHARS`], in which case it is discarded. The stream
//!    is assumed desynchronized and the partial frame unrecoverable.
//!
//! This is a best-effort resynchronizing framer, not a length-prefixed
//! protocol: it relies on the transport being newline-delimited text where a
//! complete object almost always fits one line.

use gatehub_core::constants::MAX_PENDING_FRAME_CHARS;
use serde_json::Value;

/// Stateful reassembler for newline-delimited JSON frames.
///
/// One instance exists per serial connection. Emitted frames are the raw
/// text that parsed, so callers can both forward the exact bytes (monitor
/// tap) and re-parse into typed messages.
///
/// # Example
///
/// ```
/// use gatehub_protocol::FrameReassembler;
///
/// let mut reassembler = FrameReassembler::new();
///
/// assert!(reassembler.push_line(r#"{"type":"ping","#).is_none());
/// let frame = reassembler.push_line(r#""deviceId":"x"}"#).unwrap();
/// assert_eq!(frame, r#"{"type":"ping","deviceId":"x"}"#);
/// ```
#[derive(Debug, Default)]
pub struct FrameReassembler {
    pending: String,
}

impl FrameReassembler {
    /// Create an empty reassembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of text; returns a complete frame if one formed.
    ///
    /// Leading/trailing whitespace is trimmed and blank lines are ignored,
    /// matching the line-oriented read path that feeds this.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if serde_json::from_str::<Value>(line).is_ok() {
            return Some(line.to_string());
        }

        self.pending.push_str(line);
        if serde_json::from_str::<Value>(&self.pending).is_ok() {
            return Some(std::mem::take(&mut self.pending));
        }

        if self.pending.chars().count() > MAX_PENDING_FRAME_CHARS {
            // Desync recovery: the partial frame is dropped, the next
            // well-formed line starts fresh.
            self.pending.clear();
        }

        None
    }

    /// Number of characters currently buffered for an incomplete frame.
    #[must_use]
    pub fn pending_chars(&self) -> usize {
        self.pending.chars().count()
    }

    /// Discard any partial frame, e.g. on reconnect.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
