//! Serial bridge lifecycle and read loop.
//!
//! The bridge owns the one physical serial connection. Its lifecycle is a
//! small state machine:
//!
//! ```text
//! Disconnected ──> Connecting ──> Reading ──> Disconnected
//!                      │                          ^
//!                      └──────────────────────────┘
//!                        (connect failure, logged)
//! ```
//!
//! Connect failures are not retried here; restarting the bridge is an
//! external concern. While `Reading`, a dedicated blocking task performs the
//! port reads (the port's read timeout bounds idle polling) and forwards
//! lines over a channel; the async side mirrors each line to the monitor
//! tap, runs it through the frame reassembler, and hands every complete
//! frame to its own dispatch task. Closing the port from outside ends the
//! read loop with one final logged error, which is the process-level
//! shutdown path.

use crate::dispatch::FrameDispatcher;
use crate::error::{BridgeError, BridgeResult};
use crate::writer::SerialWriter;
use gatehub_protocol::{FrameReassembler, MonitorDirection};
use gatehub_realtime::ClientHub;
use gatehub_registry::AccessEvaluator;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Serial connection configuration.
#[derive(Debug, Clone)]
pub struct SerialBridgeConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,

    /// Line speed in baud.
    pub baud_rate: u32,
}

impl Default for SerialBridgeConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
        }
    }
}

/// Bridge lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No connection; initial and terminal state.
    Disconnected,
    /// Port open in progress.
    Connecting,
    /// Read loop running.
    Reading,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            BridgeState::Disconnected => "Disconnected",
            BridgeState::Connecting => "Connecting",
            BridgeState::Reading => "Reading",
        };
        write!(f, "{}", state)
    }
}

/// Owner of the physical serial connection.
pub struct SerialBridge {
    config: SerialBridgeConfig,
    evaluator: AccessEvaluator,
    hub: Arc<ClientHub>,
    state: Arc<Mutex<BridgeState>>,
}

impl SerialBridge {
    pub fn new(
        config: SerialBridgeConfig,
        evaluator: AccessEvaluator,
        hub: Arc<ClientHub>,
    ) -> Self {
        Self {
            config,
            evaluator,
            hub,
            state: Arc::new(Mutex::new(BridgeState::Disconnected)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(BridgeState::Disconnected)
    }

    /// Shared handle to the state, for observers that outlive `run`.
    pub fn state_handle(&self) -> Arc<Mutex<BridgeState>> {
        Arc::clone(&self.state)
    }

    fn set_state(&self, next: BridgeState) {
        if let Ok(mut state) = self.state.lock() {
            debug!(from = %*state, to = %next, "Bridge state transition");
            *state = next;
        }
    }

    /// Connect and run the read loop until the stream ends.
    ///
    /// Returns `Err` only for the connect path; once reading, all failures
    /// are handled internally and the method returns `Ok` when the stream
    /// closes.
    pub async fn run(self) -> BridgeResult<()> {
        self.set_state(BridgeState::Connecting);

        let config = self.config.clone();
        let port = match tokio::task::spawn_blocking(move || open_port(&config)).await? {
            Ok(port) => port,
            Err(e) => {
                self.set_state(BridgeState::Disconnected);
                error!(port = %self.config.port, error = %e, "Serial connect failed");
                return Err(e);
            }
        };

        info!(
            port = %self.config.port,
            baud_rate = self.config.baud_rate,
            "Serial port connected"
        );

        let writer = SerialWriter::new(Box::new(port.try_clone()?));
        let dispatcher = FrameDispatcher::new(self.evaluator.clone(), Arc::clone(&self.hub), writer);
        self.set_state(BridgeState::Reading);

        let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
        let reader_task = tokio::task::spawn_blocking(move || read_lines(port, line_tx));

        let mut reassembler = FrameReassembler::new();
        while let Some(line) = line_rx.recv().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Mirror everything we read, valid JSON or not.
            self.hub
                .broadcast_monitor(line, MonitorDirection::Incoming)
                .await;

            if let Some(frame) = reassembler.push_line(line) {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(frame).await;
                });
            }
        }

        // Channel closed: the blocking reader ended (EOF or fatal error).
        reader_task.await?;
        self.set_state(BridgeState::Disconnected);
        info!("Serial bridge stopped");
        Ok(())
    }
}

fn open_port(config: &SerialBridgeConfig) -> BridgeResult<Box<dyn SerialPort>> {
    let port = serialport::new(&config.port, config.baud_rate)
        .timeout(Duration::from_secs(1))
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .open()?;
    Ok(port)
}

/// Blocking read loop: one line out per delivery, bytes in at whatever
/// boundaries the port hands us.
///
/// Read timeouts are the idle case and just poll again; they also bound how
/// long a partial line can sit unobserved. Any other I/O error is fatal to
/// the loop (the port is gone or the process is shutting down) and ends it
/// after one logged error.
fn read_lines(port: Box<dyn SerialPort>, lines: mpsc::Sender<String>) {
    let mut reader = BufReader::new(port);
    let mut buf: Vec<u8> = Vec::new();

    loop {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                info!("Serial stream closed");
                break;
            }
            Ok(_) => {
                // Invalid UTF-8 is replaced, not fatal; the reassembler
                // will fail to parse it and the monitor tap still sees it.
                let line = String::from_utf8_lossy(&buf).to_string();
                buf.clear();
                if lines.blocking_send(line).is_err() {
                    debug!("Line consumer dropped, stopping read loop");
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                // Idle poll; partial bytes stay buffered for the next pass.
                continue;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "Serial read failed, stopping read loop");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reader_firmware() {
        let config = SerialBridgeConfig::default();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 115_200);
    }

    #[test]
    fn state_display_names() {
        assert_eq!(BridgeState::Disconnected.to_string(), "Disconnected");
        assert_eq!(BridgeState::Connecting.to_string(), "Connecting");
        assert_eq!(BridgeState::Reading.to_string(), "Reading");
    }

    #[tokio::test]
    async fn connect_failure_returns_to_disconnected() {
        let db = gatehub_registry::Database::in_memory().await.unwrap();
        let media = tempfile::TempDir::new().unwrap();
        let registry =
            gatehub_registry::SqliteCardRegistry::new(db.pool().clone(), media.path());
        let evaluator = AccessEvaluator::new(registry, "http://localhost:8080/media");

        let bridge = SerialBridge::new(
            SerialBridgeConfig {
                port: "/dev/does-not-exist".to_string(),
                baud_rate: 115_200,
            },
            evaluator,
            Arc::new(ClientHub::new()),
        );
        let state = bridge.state_handle();
        assert_eq!(bridge.state(), BridgeState::Disconnected);

        let result = bridge.run().await;
        assert!(result.is_err());
        assert_eq!(
            state.lock().map(|s| *s).unwrap_or(BridgeState::Reading),
            BridgeState::Disconnected
        );
    }
}
