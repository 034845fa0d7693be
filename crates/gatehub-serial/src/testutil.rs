//! Shared helpers for bridge unit tests.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Write sink capturing everything for inspection.
#[derive(Clone, Default)]
pub(crate) struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub(crate) fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buffer) => String::from_utf8_lossy(&buffer).to_string(),
            Err(_) => String::new(),
        }
    }

    /// Written output split into JSON lines.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut buffer) = self.0.lock() {
            buffer.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
