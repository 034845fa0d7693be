//! Outbound serial write path.
//!
//! The physical connection is singly owned: every writer goes through one
//! mutex-guarded sink, and each write is one complete JSON object plus the
//! newline delimiter, flushed before returning. Partial frames never
//! interleave on the wire.

use crate::error::{BridgeError, BridgeResult};
use gatehub_protocol::DeviceReply;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Serialized writer over the serial connection.
///
/// Generic over `Write` rather than the serial port type so tests can
/// capture output in a buffer. Cloning shares the same underlying sink.
#[derive(Clone)]
pub struct SerialWriter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SerialWriter {
    /// Wrap a sink (normally a cloned serial port handle).
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Write one reply frame and flush.
    ///
    /// Runs the blocking write off the async scheduler. Returns the encoded
    /// payload so the caller can mirror it to the monitor tap.
    pub async fn write_reply(&self, reply: &DeviceReply) -> BridgeResult<String> {
        let payload = serde_json::to_string(reply)?;
        let line = format!("{payload}\n");
        let sink = Arc::clone(&self.sink);

        tokio::task::spawn_blocking(move || -> BridgeResult<()> {
            let mut guard = sink.lock().map_err(|_| BridgeError::WriterPoisoned)?;
            guard.write_all(line.as_bytes())?;
            guard.flush()?;
            Ok(())
        })
        .await??;

        debug!(payload = %payload, "Frame written to serial port");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::CaptureSink;

    #[tokio::test]
    async fn writes_one_newline_delimited_frame() {
        let capture = CaptureSink::default();
        let writer = SerialWriter::new(Box::new(capture.clone()));

        let payload = writer
            .write_reply(&DeviceReply::pong(Some("esp-1".into())))
            .await
            .unwrap();

        let written = capture.contents();
        assert_eq!(written, format!("{payload}\n"));

        let value: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(value["type"], "pong");
        assert_eq!(value["deviceId"], "esp-1");
    }

    #[tokio::test]
    async fn sequential_writes_do_not_interleave() {
        let capture = CaptureSink::default();
        let writer = SerialWriter::new(Box::new(capture.clone()));

        writer
            .write_reply(&DeviceReply::card_response("KEY", true))
            .await
            .unwrap();
        writer
            .write_reply(&DeviceReply::pong(None))
            .await
            .unwrap();

        let written = capture.contents();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(serde_json::from_str::<serde_json::Value>(line).is_ok());
        }
    }
}
